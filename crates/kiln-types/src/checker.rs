// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type checker implementation.

use std::collections::HashMap;

use kiln_ast::expr::{BinOp, Block, Expr, ExprKind, OpKind, UnaryOp};
use kiln_ast::stmt::{Stmt, StmtKind};
use kiln_ast::symbol::{FnDecl, SymbolKind};
use kiln_ast::ty::Type;
use kiln_ast::{NodeId, Program, Span, Spanned};
use kiln_symbols::{ScopeId, SymbolTable};

use crate::TypeError;

/// The resolved type of every checked node, keyed by node id.
pub type TypeMap = HashMap<NodeId, Type>;

/// Per-function checking state.
struct FnContext {
    return_type: Type,
    /// Whether the body contains an explicit `return` anywhere. When it
    /// does, control reaches the closing brace only via fallthrough, so the
    /// tail expression must be unit.
    explicit_return: bool,
}

/// The bidirectional type checking pass.
pub struct TypeCheck<'a> {
    program: &'a Program,
    table: &'a SymbolTable,
    types: TypeMap,
    scope: Option<ScopeId>,
    ctx: FnContext,
    errors: Vec<TypeError>,
}

impl<'a> TypeCheck<'a> {
    pub fn new(program: &'a Program, table: &'a SymbolTable) -> Self {
        Self {
            program,
            table,
            types: HashMap::new(),
            scope: None,
            ctx: FnContext { return_type: Type::Unit, explicit_return: false },
            errors: Vec::new(),
        }
    }

    /// Check the whole program, collecting every type error.
    pub fn run(mut self) -> Result<TypeMap, Vec<TypeError>> {
        for symbol in &self.program.symbols {
            match &symbol.kind {
                SymbolKind::Function(f) => self.check_function(f),
                SymbolKind::Static(g) | SymbolKind::Const(g) => {
                    self.check_expr(&g.init, Some(g.binding.ty.value));
                }
            }
        }

        if self.errors.is_empty() {
            Ok(self.types)
        } else {
            Err(self.errors)
        }
    }

    fn check_function(&mut self, f: &FnDecl) {
        self.ctx = FnContext { return_type: f.ret, explicit_return: false };

        let implicit = self.check_block(&f.body, None);

        if self.ctx.explicit_return {
            // There was an explicit return, so the body itself has to
            // evaluate to unit.
            self.expect_type(implicit, Type::Unit, f.body.span);
        } else if implicit == Type::Unit && f.ret != Type::Unit {
            // No explicit return and nothing falls out of the body either.
            self.errors.push(TypeError::MissingReturn { span: f.body.span });
        } else {
            self.expect_type(implicit, f.ret, f.body.span);
        }
    }

    fn check_block(&mut self, block: &Block, expected: Option<Type>) -> Type {
        let saved = self.scope;
        self.scope = Some(self.table.scope_of(block.id));

        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }

        let block_type = self.check_expr(&block.tail, expected);
        self.types.insert(block.id, block_type);

        self.scope = saved;

        block_type
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { binding, init } => {
                let scope = self.scope.expect("declaration outside of any scope");
                let ty = self
                    .table
                    .resolve_variable(scope, &binding.name.value)
                    .unwrap_or_else(|| {
                        panic!("variable {} missing in symbol table", binding.name.value)
                    });
                self.check_expr(init, Some(ty));
            }
            StmtKind::Expr(e) => {
                self.check_expr(e, None);
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr, expected: Option<Type>) -> Type {
        let ty = match &expr.kind {
            ExprKind::Literal(value) => value.ty(),
            ExprKind::Var(name) => self.resolve_var(name),
            ExprKind::Block(block) => self.check_block(block, expected),
            ExprKind::Assign { left, right } => {
                // The left side determines what the right must be
                let left_ty = self.check_expr(left, None);
                self.check_expr(right, Some(left_ty));
                Type::Unit
            }
            ExprKind::AssignOp { op, left, right } => {
                self.check_binary(*op, left, right);
                Type::Unit
            }
            ExprKind::Return(value) => {
                self.ctx.explicit_return = true;
                let ret = self.ctx.return_type;
                self.check_expr(value, Some(ret))
            }
            ExprKind::Call { callee, args } => self.check_call(callee, args),
            ExprKind::Group(inner) => self.check_expr(inner, expected),
            ExprKind::Binary { op, left, right } => self.check_binary(*op, left, right),
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand),
            ExprKind::If { cond, then_block, else_block } => {
                self.check_if(cond, then_block, else_block.as_deref(), expected)
            }
            ExprKind::While { cond, body } => {
                self.check_expr(cond, Some(Type::Bool));
                self.check_block(body, Some(Type::Unit));
                Type::Unit
            }
            ExprKind::Break | ExprKind::Unit => Type::Unit,
        };

        self.types.insert(expr.id, ty);

        if let Some(expected) = expected {
            return self.expect_type(ty, expected, expr.span);
        }

        ty
    }

    fn resolve_var(&mut self, name: &Spanned<String>) -> Type {
        let scope = self.scope.expect("variable reference outside of any scope");

        match self.table.resolve_variable(scope, &name.value) {
            Some(ty) => ty,
            None => {
                self.errors.push(TypeError::NoVariable {
                    name: name.value.clone(),
                    span: name.span,
                });
                Type::Err
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr]) -> Type {
        let ExprKind::Var(name) = &callee.kind else {
            // The resolver rejects non-identifier call targets before this
            // pass ever runs.
            panic!("call target is not a bare identifier");
        };

        let Some((params, ret)) = self.table.lookup_function(&name.value) else {
            self.errors.push(TypeError::NoFunction {
                name: name.value.clone(),
                span: callee.span,
            });
            return Type::Err;
        };
        let params = params.to_vec();

        if args.len() != params.len() {
            self.errors.push(TypeError::ArgCount {
                expected: params.len(),
                got: args.len(),
                span: callee.span,
            });
        }

        for (arg, param_ty) in args.iter().zip(params) {
            self.check_expr(arg, Some(param_ty));
        }

        ret
    }

    fn check_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Type {
        match op.kind() {
            OpKind::Arithmetic => {
                self.check_expr(left, Some(Type::Int));
                self.check_expr(right, Some(Type::Int));
                Type::Int
            }
            OpKind::Logic => {
                self.check_expr(left, Some(Type::Bool));
                self.check_expr(right, Some(Type::Bool));
                Type::Bool
            }
            OpKind::Bitwise => {
                // Both ints and bools are accepted; the left operand fixes
                // which one this expression uses.
                let ty = self.check_expr(left, None);
                match ty {
                    Type::Bool | Type::Int => self.check_expr(right, Some(ty)),
                    Type::Err => Type::Err,
                    _ => {
                        self.errors.push(TypeError::BinaryOperand {
                            op,
                            ty,
                            span: left.span,
                        });
                        Type::Err
                    }
                }
            }
            OpKind::Comparison => {
                let ty = self.check_expr(left, None);
                self.check_expr(right, Some(ty));
                Type::Bool
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr) -> Type {
        match op {
            UnaryOp::Neg => self.check_expr(operand, Some(Type::Int)),
            UnaryOp::Not => {
                let ty = self.check_expr(operand, None);
                match ty {
                    Type::Bool | Type::Int => ty,
                    Type::Err => Type::Err,
                    _ => {
                        self.errors.push(TypeError::UnaryOperand {
                            op,
                            ty,
                            span: operand.span,
                        });
                        Type::Err
                    }
                }
            }
        }
    }

    fn check_if(
        &mut self,
        cond: &Expr,
        then_block: &Block,
        else_block: Option<&Block>,
        expected: Option<Type>,
    ) -> Type {
        self.check_expr(cond, Some(Type::Bool));

        // Check the consequence against the expectation, or infer from it
        let then_ty = self.check_block(then_block, expected);

        if let Some(alt) = else_block {
            self.check_block(alt, Some(then_ty));
        } else if expected.is_some_and(|e| e != Type::Unit) {
            self.errors.push(TypeError::MissingElse { span: then_block.span });
        }

        if let Some(expected) = expected {
            // A mismatch was already reported while checking the consequence
            // above; poison the result so the caller stays quiet.
            if expected != then_ty {
                return Type::Err;
            }
        }

        then_ty
    }

    /// Validate an inferred type against an expectation.
    ///
    /// Poison flows through silently in either position so one underlying
    /// mistake produces one diagnostic.
    fn expect_type(&mut self, actual: Type, expected: Type, span: Span) -> Type {
        if actual == Type::Err || expected == Type::Err {
            return Type::Err;
        }

        if actual != expected {
            self.errors.push(TypeError::Mismatch { expected, actual, span });
            return Type::Err;
        }

        actual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(src: &str) -> Result<TypeMap, Vec<TypeError>> {
        let tokens = kiln_lexer::Lexer::new(src).tokenize().expect("lex failed");
        let program = kiln_parser::Parser::new(tokens).parse().expect("parse failed");
        let table = kiln_symbols::build(&program).expect("resolution failed");
        TypeCheck::new(&program, &table).run()
    }

    fn errors(src: &str) -> Vec<TypeError> {
        check(src).expect_err("expected type errors")
    }

    #[test]
    fn well_typed_program() {
        assert!(check(
            "fn mul(a: int, b: int) -> int {\n\
                 let i: int = 0;\n\
                 while i < 10 {\n\
                     b += if b > 0 { b * 4 } else { -8 };\n\
                     i += 1;\n\
                 }\n\
                 i\n\
             }\n\
             fn main() { println(mul(3, 5)); }"
        )
        .is_ok());
    }

    #[test]
    fn literal_types_are_recorded() {
        let types = check("fn main() -> int { 41 + 1 }").unwrap();
        assert!(types.values().any(|t| *t == Type::Int));
    }

    #[test]
    fn arithmetic_requires_ints() {
        let errs = errors("fn main() { 1 + true; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Int, actual: Type::Bool, .. }
        ));
    }

    #[test]
    fn logic_requires_bools() {
        let errs = errors("fn main() { 1 && true; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Bool, actual: Type::Int, .. }
        ));
    }

    #[test]
    fn bitwise_infers_from_the_left() {
        assert!(check("fn main() { let b: bool = true & false; let i: int = 1 & 2; }").is_ok());

        let errs = errors("fn main() { true & 1; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Bool, actual: Type::Int, .. }
        ));
    }

    #[test]
    fn bitwise_rejects_strings() {
        let errs = errors("fn main() { \"a\" | \"b\"; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], TypeError::BinaryOperand { op: BinOp::BitOr, .. }));
    }

    #[test]
    fn comparison_accepts_any_matching_pair() {
        assert!(check("fn main() { let b: bool = 'a' == 'b'; }").is_ok());

        let errs = errors("fn main() { 1 == true; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], TypeError::Mismatch { .. }));
    }

    #[test]
    fn not_preserves_bool_or_int() {
        let types = check("fn main() { let a: bool = !true; let b: int = !1; }");
        assert!(types.is_ok());

        let errs = errors("fn main() { !\"s\"; }");
        assert!(matches!(errs[0], TypeError::UnaryOperand { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn assignment_is_unit_and_infers_right_from_left() {
        let errs = errors("fn main() { let x: int = 0; x = true; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Int, actual: Type::Bool, .. }
        ));
    }

    #[test]
    fn if_as_statement_needs_no_else() {
        assert!(check("fn main() { let x: int = 1; if x == 1 { } else { } }").is_ok());
        assert!(check("fn main() { let x: int = 1; if x == 1 { } }").is_ok());
    }

    #[test]
    fn if_as_value_requires_else() {
        assert!(check("fn main() { let x: int = 1; let y: int = if x == 1 { 1 } else { 2 }; }")
            .is_ok());

        let errs = errors("fn main() { let x: int = 1; let y: int = if x == 1 { 1 }; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], TypeError::MissingElse { .. }));
    }

    #[test]
    fn if_arms_must_agree() {
        let errs = errors("fn main() { let y: int = if true { 1 } else { false }; }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Int, actual: Type::Bool, .. }
        ));
    }

    #[test]
    fn arm_mismatch_does_not_cascade_into_the_binding() {
        // One mistake, one diagnostic: the poisoned `if` stays quiet upward
        let errs = errors("fn main() { let y: int = if true { false } else { false }; }");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn bare_return_in_int_function_is_a_type_error() {
        let errs = errors("fn f() -> int { return; }\nfn main() { }");
        assert_eq!(errs.len(), 1);
        let TypeError::Mismatch { expected, actual, span } = &errs[0] else {
            panic!("expected a mismatch");
        };
        assert_eq!(*expected, Type::Int);
        assert_eq!(*actual, Type::Unit);
        // Reported at the missing value's position, right before the `;`
        assert_eq!(span.start, 22);
    }

    #[test]
    fn missing_return_value() {
        let errs = errors("fn f() -> int { }\nfn main() { }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], TypeError::MissingReturn { .. }));
    }

    #[test]
    fn tail_expression_can_satisfy_the_return_type() {
        assert!(check("fn f() -> int { 42 }\nfn main() { }").is_ok());
    }

    #[test]
    fn explicit_return_forces_unit_tail() {
        let errs = errors("fn f() -> int { return 1; 2 }\nfn main() { }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Unit, actual: Type::Int, .. }
        ));
    }

    #[test]
    fn call_signatures_are_enforced() {
        let errs = errors("fn f(a: int) -> int { a }\nfn main() { f(1, 2); }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], TypeError::ArgCount { expected: 1, got: 2, .. }));

        let errs = errors("fn f(a: int) -> int { a }\nfn main() { f(true); }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], TypeError::Mismatch { .. }));
    }

    #[test]
    fn call_results_are_typed() {
        let errs = errors("fn f() -> bool { true }\nfn main() { let x: int = f(); }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Int, actual: Type::Bool, .. }
        ));
    }

    #[test]
    fn while_condition_is_bool_and_body_is_unit() {
        let errs = errors("fn main() { while 1 { } }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Bool, actual: Type::Int, .. }
        ));

        let errs = errors("fn main() { while true { 1 } }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Unit, actual: Type::Int, .. }
        ));
    }

    #[test]
    fn global_initializers_check_against_their_declared_type() {
        let errs = errors("static S: int = true;\nfn main() { }");
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0],
            TypeError::Mismatch { expected: Type::Int, actual: Type::Bool, .. }
        ));
    }

    #[test]
    fn pow_operator_types_as_arithmetic() {
        assert!(check("fn main() { let x: int = 2 ** 8; }").is_ok());
    }

    #[test]
    fn block_types_flow_to_their_tail() {
        let types = check("fn main() -> int { { 1; 2 } }").unwrap();
        // Both the inner and outer block are int-typed
        let ints = types.values().filter(|t| **t == Type::Int).count();
        assert!(ints >= 2);
    }
}
