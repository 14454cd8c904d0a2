// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Builds the symbol table in two passes: flat global registration, then
//! scope construction and identifier resolution over every function body.

use std::collections::HashSet;

use kiln_ast::expr::{Block, Expr, ExprKind};
use kiln_ast::stmt::{Stmt, StmtKind};
use kiln_ast::symbol::{FnDecl, SymbolKind};
use kiln_ast::Program;

use crate::natives::NATIVES;
use crate::table::{ScopeId, SymbolInfo, SymbolTable};
use crate::ResolveError;

/// Build and resolve the symbol table for a program.
pub fn build(program: &Program) -> Result<SymbolTable, Vec<ResolveError>> {
    let mut table = SymbolTable::new();
    let mut errors = Vec::new();

    // Native builtins are pre-registered before any user symbol
    for native in NATIVES {
        table.register_symbol(
            native.name,
            SymbolInfo::Native {
                params: native.params.to_vec(),
                ret: native.ret,
                kind: native.kind,
            },
        );
    }

    // First pass: flat registration of every top-level symbol.
    // The first definition wins; later ones are rejected, not overwritten.
    for symbol in &program.symbols {
        let info = match &symbol.kind {
            SymbolKind::Function(f) => {
                let (params, ret) = f.signature();
                SymbolInfo::Function { params, ret }
            }
            SymbolKind::Static(g) => SymbolInfo::Static { ty: g.binding.ty.value },
            SymbolKind::Const(g) => SymbolInfo::Const { ty: g.binding.ty.value },
        };

        if !table.register_symbol(symbol.name(), info) {
            errors.push(ResolveError::Redeclared {
                name: symbol.name().to_string(),
                span: symbol.span,
            });
        }
    }

    // Second pass: build block scopes and resolve identifier uses.
    // Global initializers are literals and carry nothing to resolve.
    let mut builder = ScopeBuilder { table: &mut table, errors: &mut errors, current: None };
    for symbol in &program.symbols {
        if let SymbolKind::Function(f) = &symbol.kind {
            builder.build_function(f);
        }
    }

    if errors.is_empty() {
        Ok(table)
    } else {
        Err(errors)
    }
}

struct ScopeBuilder<'a> {
    table: &'a mut SymbolTable,
    errors: &'a mut Vec<ResolveError>,
    current: Option<ScopeId>,
}

impl ScopeBuilder<'_> {
    fn build_function(&mut self, f: &FnDecl) {
        // The function body is the outermost scope; parameters live in it
        let scope = self.table.register_scope(f.body.id, None);

        self.register_params(f, scope);

        self.current = Some(scope);
        self.visit_block_contents(&f.body);
        self.current = None;
    }

    fn register_params(&mut self, f: &FnDecl, scope: ScopeId) {
        let mut seen = HashSet::new();
        let mut collided = false;

        for param in &f.params {
            if !seen.insert(param.name.value.as_str()) {
                self.errors.push(ResolveError::DuplicateParam {
                    name: param.name.value.clone(),
                    span: param.span,
                });
                collided = true;
            }
        }

        // A colliding parameter list is not registered at all
        if collided {
            return;
        }

        for param in &f.params {
            self.table.register_variable(scope, &param.name.value, param.ty.value);
        }
    }

    /// Register a nested block's scope and walk its contents.
    fn visit_block(&mut self, block: &Block) {
        let parent = self.current;
        let scope = self.table.register_scope(block.id, parent);

        self.current = Some(scope);
        self.visit_block_contents(block);
        self.current = parent;
    }

    fn visit_block_contents(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.visit_stmt(stmt);
        }
        self.visit_expr(&block.tail);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { binding, init } => {
                // The name registers at its declaration; it is visible from
                // here onward, not earlier in the block.
                let scope = self.current.expect("declaration outside of any scope");
                if !self.table.register_variable(scope, &binding.name.value, binding.ty.value) {
                    self.errors.push(ResolveError::Redeclared {
                        name: binding.name.value.clone(),
                        span: binding.span,
                    });
                }
                self.visit_expr(init);
            }
            StmtKind::Expr(e) => self.visit_expr(e),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call { callee, args } => {
                self.resolve_call(callee);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Var(name) => {
                let scope = self.current.expect("variable reference outside of any scope");
                if self.table.resolve_variable(scope, &name.value).is_none() {
                    self.errors.push(ResolveError::UndeclaredVariable {
                        name: name.value.clone(),
                        span: name.span,
                    });
                }
            }
            ExprKind::Assign { left, right } | ExprKind::AssignOp { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            ExprKind::Binary { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            ExprKind::Unary { operand, .. } => self.visit_expr(operand),
            ExprKind::Group(inner) | ExprKind::Return(inner) => self.visit_expr(inner),
            ExprKind::Block(block) => self.visit_block(block),
            ExprKind::If { cond, then_block, else_block } => {
                self.visit_expr(cond);
                self.visit_block(then_block);
                if let Some(alt) = else_block {
                    self.visit_block(alt);
                }
            }
            ExprKind::While { cond, body } => {
                self.visit_expr(cond);
                self.visit_block(body);
            }
            ExprKind::Literal(_) | ExprKind::Break | ExprKind::Unit => {}
        }
    }

    /// A call target must be a bare identifier naming a callable symbol.
    fn resolve_call(&mut self, callee: &Expr) {
        let ExprKind::Var(name) = &callee.kind else {
            self.errors.push(ResolveError::NotCallable { span: callee.span });
            return;
        };

        match self.table.lookup_symbol(&name.value) {
            None => self.errors.push(ResolveError::UnknownFunction {
                name: name.value.clone(),
                span: callee.span,
            }),
            Some(SymbolInfo::Function { .. }) | Some(SymbolInfo::Native { .. }) => {}
            Some(SymbolInfo::Static { .. }) | Some(SymbolInfo::Const { .. }) => {
                self.errors.push(ResolveError::NotCallable { span: callee.span });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ast::ty::Type;

    fn build_src(src: &str) -> Result<SymbolTable, Vec<ResolveError>> {
        let tokens = kiln_lexer::Lexer::new(src).tokenize().expect("lex failed");
        let program = kiln_parser::Parser::new(tokens).parse().expect("parse failed");
        build(&program)
    }

    fn body_scope(src: &str) -> (SymbolTable, kiln_ast::NodeId) {
        let tokens = kiln_lexer::Lexer::new(src).tokenize().expect("lex failed");
        let program = kiln_parser::Parser::new(tokens).parse().expect("parse failed");
        let body_id = program
            .symbols
            .iter()
            .find_map(|s| match &s.kind {
                SymbolKind::Function(f) => Some(f.body.id),
                _ => None,
            })
            .expect("no function in test source");
        (build(&program).expect("resolution failed"), body_id)
    }

    #[test]
    fn natives_are_registered() {
        let table = build_src("fn main() { }").unwrap();
        assert!(matches!(
            table.lookup_symbol("println"),
            Some(SymbolInfo::Native { .. })
        ));
        let (params, ret) = table.lookup_function("pow").unwrap();
        assert_eq!(params, &[Type::Int, Type::Int]);
        assert_eq!(ret, Type::Int);
    }

    #[test]
    fn redeclaring_a_global_reports_the_second_site() {
        let errors = build_src("const N: int = 1;\nconst N: int = 1;\nfn main() { }").unwrap_err();
        assert_eq!(errors.len(), 1);
        let ResolveError::Redeclared { name, span } = &errors[0] else {
            panic!("expected a redeclaration error");
        };
        assert_eq!(name, "N");
        // Second declaration starts on line 2
        assert_eq!(span.start, 18);
    }

    #[test]
    fn parameters_resolve_in_the_body() {
        let (table, body) = body_scope("fn f(a: int, b: bool) { a; b; }");
        let scope = table.scope_of(body);
        assert_eq!(table.resolve_variable(scope, "a"), Some(Type::Int));
        assert_eq!(table.resolve_variable(scope, "b"), Some(Type::Bool));
        assert_eq!(table.resolve_variable(scope, "c"), None);
    }

    #[test]
    fn duplicate_parameters_report_each_extra_occurrence() {
        let errors = build_src("fn main(a: int, a: int, a: int) { }").unwrap_err();
        let dups: Vec<_> = errors
            .iter()
            .filter(|e| matches!(e, ResolveError::DuplicateParam { .. }))
            .collect();
        assert_eq!(dups.len(), 2);
    }

    #[test]
    fn undeclared_variable() {
        let errors = build_src("fn main() { missing; }").unwrap_err();
        assert_eq!(errors.len(), 1);
        let ResolveError::UndeclaredVariable { name, span } = &errors[0] else {
            panic!("expected an undeclared-variable error");
        };
        assert_eq!(name, "missing");
        assert_eq!(span.start, 12);
    }

    #[test]
    fn name_is_not_visible_before_its_declaration() {
        let errors = build_src("fn main() { x; let x: int = 1; }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::UndeclaredVariable { .. }));
    }

    #[test]
    fn inner_blocks_see_outer_bindings() {
        assert!(build_src("fn main() { let x: int = 1; { let y: int = x; y; } x; }").is_ok());
    }

    #[test]
    fn bindings_do_not_escape_their_block() {
        let errors = build_src("fn main() { { let y: int = 1; } y; }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::UndeclaredVariable { .. }));
    }

    #[test]
    fn globals_are_a_resolution_fallback() {
        assert!(build_src("static S: int = 1;\nconst C: int = 2;\nfn main() { S; C; }").is_ok());
    }

    #[test]
    fn call_targets_must_be_callable() {
        let errors = build_src("fn main() { missing(); }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::UnknownFunction { .. }));

        let errors = build_src("const C: int = 1;\nfn main() { C(); }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::NotCallable { .. }));

        let errors = build_src("fn main() { (1)(); }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::NotCallable { .. }));
    }

    #[test]
    fn call_arguments_are_resolved() {
        let errors = build_src("fn main() { println(missing); }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::UndeclaredVariable { .. }));
    }

    #[test]
    fn redeclaring_a_local_in_the_same_scope() {
        let errors = build_src("fn main() { let x: int = 1; let x: int = 2; }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ResolveError::Redeclared { .. }));
    }

    #[test]
    fn shadowing_in_a_nested_scope_is_allowed() {
        assert!(build_src("fn main() { let x: int = 1; { let x: int = 2; x; } }").is_ok());
    }
}
