// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Per-method code generation.

use std::collections::HashMap;

use kiln_ast::expr::{BinOp, Block, Expr, ExprKind, OpKind, UnaryOp, Value};
use kiln_ast::stmt::{Stmt, StmtKind};
use kiln_ast::ty::Type;
use kiln_classfile::{op, CodeBuilder, ConstantPool};
use kiln_symbols::natives::{self, NativeKind};
use kiln_types::TypeMap;

use crate::bytecode;
use crate::stack::OperandStack;
use crate::vars::{Variable, Variables};

/// Generates the body of one method.
///
/// Emission and the operand-stack model move in lock-step: every helper
/// that writes an instruction records its effect, so after any discarded
/// sub-expression the simulated depth returns exactly to its entry value.
pub(crate) struct CodeGen<'a> {
    class_name: &'a str,
    functions: &'a HashMap<String, (Vec<Type>, Type)>,
    fields: &'a HashMap<String, Type>,
    constants: &'a HashMap<String, Value>,
    types: &'a TypeMap,
    return_type: Type,
    pool: &'a mut ConstantPool,
    pub code: CodeBuilder,
    stack: OperandStack,
    vars: Variables,
}

impl<'a> CodeGen<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        class_name: &'a str,
        functions: &'a HashMap<String, (Vec<Type>, Type)>,
        fields: &'a HashMap<String, Type>,
        constants: &'a HashMap<String, Value>,
        types: &'a TypeMap,
        return_type: Type,
        pool: &'a mut ConstantPool,
        vars: Variables,
    ) -> Self {
        Self {
            class_name,
            functions,
            fields,
            constants,
            types,
            return_type,
            pool,
            code: CodeBuilder::new(),
            stack: OperandStack::new(),
            vars,
        }
    }

    /// Generate a block: statements discard back to their entry depth, the
    /// tail expression's value (if any) is left on the stack.
    pub fn gen_block(&mut self, block: &Block) {
        self.vars.push_scope(block.id);

        for stmt in &block.stmts {
            self.gen_stmt(stmt);
        }

        self.gen_expr(&block.tail);

        self.vars.pop_scope();
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { binding, init } => {
                self.gen_expr(init);

                let variable = self.vars.define(&binding.name.value, binding.ty.value);
                self.store_var(variable);
            }
            StmtKind::Expr(e) => {
                let mark = self.stack.size();

                self.gen_expr(e);

                self.discard_down_to(mark);
            }
        }
    }

    pub fn gen_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Block(block) => self.gen_block(block),
            ExprKind::Literal(value) => self.push_value(value),
            ExprKind::Var(name) => self.gen_var(&name.value),
            ExprKind::Assign { left, right } => {
                self.gen_expr(right);
                self.store_to(left);
            }
            ExprKind::AssignOp { op, left, right } => {
                self.gen_binary(*op, left, right);
                self.store_to(left);
            }
            ExprKind::Return(value) => self.gen_return(value),
            ExprKind::Call { callee, args } => self.gen_call(callee, args),
            ExprKind::Group(inner) => self.gen_expr(inner),
            ExprKind::Binary { op, left, right } => self.gen_binary(*op, left, right),
            ExprKind::Unary { op, operand } => self.gen_unary(*op, operand),
            ExprKind::If { cond, then_block, else_block } => {
                self.gen_if(cond, then_block, else_block.as_deref())
            }
            ExprKind::While { cond, body } => self.gen_while(cond, body),
            ExprKind::Break => {
                let target = self
                    .vars
                    .break_label()
                    .expect("`break` outside of loop survived checking");
                self.code.jump(op::GOTO, target);
            }
            ExprKind::Unit => {}
        }
    }

    // =========================================================================
    // Values and variables
    // =========================================================================

    /// Emit a literal and record its push.
    fn push_value(&mut self, value: &Value) {
        self.emit_value(value);
        self.stack.push(value.ty());
    }

    /// Emit a literal without touching the model; used where only one of
    /// several emitted pushes can execute.
    fn emit_value(&mut self, value: &Value) {
        match value {
            Value::Bool(b) => self.code.const_int(self.pool, *b as i32),
            Value::Int(n) => self.code.const_int(self.pool, *n),
            Value::Char(c) => self.code.const_int(self.pool, *c as i32),
            Value::Str(s) => self.code.const_string(self.pool, s),
        }
    }

    fn gen_var(&mut self, name: &str) {
        if let Some(variable) = self.vars.lookup(name) {
            return self.load_var(variable);
        }

        // Statics are real fields
        if let Some(&ty) = self.fields.get(name) {
            self.code.field(
                self.pool,
                op::GETSTATIC,
                self.class_name,
                name,
                bytecode::field_descriptor(ty),
            );
            self.stack.push(ty);
            return;
        }

        // Constants are inlined at every use site
        if let Some(value) = self.constants.get(name) {
            let value = value.clone();
            return self.push_value(&value);
        }

        panic!("undefined variable {} survived resolution", name);
    }

    fn load_var(&mut self, variable: Variable) {
        if bytecode::is_reference(variable.ty) {
            self.code.aload(variable.slot);
        } else {
            self.code.iload(variable.slot);
        }
        self.stack.push(variable.ty);
    }

    fn store_var(&mut self, variable: Variable) {
        if bytecode::is_reference(variable.ty) {
            self.code.astore(variable.slot);
        } else {
            self.code.istore(variable.slot);
        }
        self.stack.forget(1);
    }

    /// Store the value on top of the stack into an assignment target.
    fn store_to(&mut self, left: &Expr) {
        let ExprKind::Var(name) = &left.kind else {
            panic!("assignment to a non-variable survived checking");
        };

        if let Some(variable) = self.vars.lookup(&name.value) {
            return self.store_var(variable);
        }

        if let Some(&ty) = self.fields.get(name.value.as_str()) {
            self.code.field(
                self.pool,
                op::PUTSTATIC,
                self.class_name,
                &name.value,
                bytecode::field_descriptor(ty),
            );
            self.stack.forget(1);
            return;
        }

        panic!("assignment target {} survived resolution", name.value);
    }

    /// Store the value on top of the stack into a static field of the
    /// generated class; used by the static initializer.
    pub fn store_static(&mut self, name: &str, ty: Type) {
        self.code.field(
            self.pool,
            op::PUTSTATIC,
            self.class_name,
            name,
            bytecode::field_descriptor(ty),
        );
        self.stack.forget(1);
    }

    /// Emit POPs until the model is back at `mark`.
    fn discard_down_to(&mut self, mark: usize) {
        while self.stack.size() > mark {
            self.code.op(op::POP);
            self.stack.forget(1);
        }
    }

    // =========================================================================
    // Calls and returns
    // =========================================================================

    fn gen_return(&mut self, value: &Expr) {
        if matches!(value.kind, ExprKind::Unit) {
            return self.code.op(op::RETURN);
        }

        self.gen_expr(value);

        self.code.op(bytecode::return_op(self.return_type));
        self.stack.forget(1);
    }

    fn gen_call(&mut self, callee: &Expr, args: &[Expr]) {
        let ExprKind::Var(name) = &callee.kind else {
            panic!("call of a non-function survived checking");
        };

        if let Some(native) = natives::lookup(&name.value) {
            return match native.kind {
                NativeKind::Println => self.gen_println(args),
                NativeKind::Pow => self.gen_pow(args),
            };
        }

        // User functions are instance methods; the receiver is implicit
        self.code.aload(0);

        for arg in args {
            self.gen_expr(arg);
        }

        let (params, ret) = self
            .functions
            .get(&name.value)
            .unwrap_or_else(|| panic!("function {} survived resolution", name.value));
        let descriptor = bytecode::method_descriptor(params, *ret);
        let ret = *ret;

        self.code.invoke(
            self.pool,
            op::INVOKEVIRTUAL,
            self.class_name,
            &name.value,
            &descriptor,
        );

        self.stack.forget(args.len());

        if ret != Type::Unit {
            self.stack.push(ret);
        }
    }

    fn gen_println(&mut self, args: &[Expr]) {
        assert!(args.len() == 1, "argument count mismatch for println");

        self.code.field(
            self.pool,
            op::GETSTATIC,
            "java/lang/System",
            "out",
            "Ljava/io/PrintStream;",
        );

        for arg in args {
            self.gen_expr(arg);
        }

        self.code.invoke(
            self.pool,
            op::INVOKEVIRTUAL,
            "java/io/PrintStream",
            "println",
            "(I)V",
        );

        self.stack.forget(args.len());
    }

    /// Integer exponentiation: widen to double, `Math.pow`, truncate back.
    fn gen_pow_pair(&mut self, left: &Expr, right: &Expr) {
        for operand in [left, right] {
            self.gen_expr(operand);
            self.code.op(op::I2D);
        }

        self.stack.forget(2);

        self.code.invoke(self.pool, op::INVOKESTATIC, "java/lang/Math", "pow", "(DD)D");
        self.code.op(op::D2I);

        self.stack.push(Type::Int);
    }

    fn gen_pow(&mut self, args: &[Expr]) {
        assert!(args.len() == 2, "argument count mismatch for pow");
        self.gen_pow_pair(&args[0], &args[1]);
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn gen_binary(&mut self, bin_op: BinOp, left: &Expr, right: &Expr) {
        match bin_op {
            // Arithmetic
            BinOp::Add => self.gen_arithmetic(op::IADD, left, right),
            BinOp::Sub => self.gen_arithmetic(op::ISUB, left, right),
            BinOp::Mul => self.gen_arithmetic(op::IMUL, left, right),
            BinOp::Div => self.gen_arithmetic(op::IDIV, left, right),
            BinOp::Mod => self.gen_arithmetic(op::IREM, left, right),
            BinOp::Pow => self.gen_pow_pair(left, right),
            BinOp::Shl => self.gen_arithmetic(op::ISHL, left, right),
            BinOp::Shr => self.gen_arithmetic(op::ISHR, left, right),

            // Bitwise
            BinOp::BitXor => self.gen_arithmetic(op::IXOR, left, right),
            BinOp::BitAnd => self.gen_arithmetic(op::IAND, left, right),
            BinOp::BitOr => self.gen_arithmetic(op::IOR, left, right),

            // Logic, short-circuiting
            BinOp::And => self.gen_logic(op::IFEQ, false, left, right),
            BinOp::Or => self.gen_logic(op::IFNE, true, left, right),

            // Comparisons materialize a bool when used as values
            BinOp::Eq | BinOp::Lt | BinOp::Le | BinOp::Ne | BinOp::Ge | BinOp::Gt => {
                self.gen_comparison(
                    bin_op,
                    left,
                    right,
                    |g| g.emit_value(&Value::Bool(true)),
                    |g| g.emit_value(&Value::Bool(false)),
                );

                self.stack.push(Type::Bool);
            }
        }
    }

    fn gen_arithmetic(&mut self, opcode: u8, left: &Expr, right: &Expr) {
        self.gen_expr(left);
        self.gen_expr(right);

        assert!(self.stack.size() >= 2, "arithmetic operation needs 2 operands");

        self.code.op(opcode);

        self.stack.forget(1);
    }

    /// Short-circuit `&&`/`||`: the left operand alone decides the result
    /// on `short_op`, otherwise the right operand decides. Both paths push
    /// a literal bool and fall into a shared join label.
    fn gen_logic(&mut self, short_op: u8, short_value: bool, left: &Expr, right: &Expr) {
        let decided = self.code.new_label();
        let end = self.code.new_label();

        self.gen_expr(left);
        self.code.jump(short_op, decided);
        self.stack.forget(1);

        self.gen_expr(right);
        self.code.jump(short_op, decided);
        self.stack.forget(1);

        self.emit_value(&Value::Bool(!short_value));
        self.code.jump(op::GOTO, end);

        self.code.bind(decided);
        self.emit_value(&Value::Bool(short_value));

        self.stack.push(Type::Bool);

        self.code.bind(end);
    }

    /// Fused comparison branch: the comparison becomes a conditional jump
    /// with no intermediate bool. `conseq` runs on a match, `altern` on the
    /// fall-through.
    fn gen_comparison(
        &mut self,
        bin_op: BinOp,
        left: &Expr,
        right: &Expr,
        conseq: impl FnOnce(&mut Self),
        altern: impl FnOnce(&mut Self),
    ) {
        let is_true = self.code.new_label();
        let end = self.code.new_label();

        self.gen_expr(left);
        self.gen_expr(right);

        let opcode = self.comparison_op(bin_op, left);
        self.code.jump(opcode, is_true);
        self.stack.forget(2);

        altern(self);

        self.code.jump(op::GOTO, end);

        self.code.bind(is_true);

        conseq(self);

        self.code.bind(end);
    }

    /// The conditional jump taken when the comparison holds.
    fn comparison_op(&self, bin_op: BinOp, left: &Expr) -> u8 {
        // String equality compares references
        let operand_ty = self.types.get(&left.id).copied();
        if operand_ty == Some(Type::Str) {
            return match bin_op {
                BinOp::Eq => op::IF_ACMPEQ,
                BinOp::Ne => op::IF_ACMPNE,
                other => panic!("comparison `{}` is not defined on str", other),
            };
        }

        match bin_op {
            BinOp::Eq => op::IF_ICMPEQ,
            BinOp::Lt => op::IF_ICMPLT,
            BinOp::Le => op::IF_ICMPLE,
            BinOp::Ne => op::IF_ICMPNE,
            BinOp::Ge => op::IF_ICMPGE,
            BinOp::Gt => op::IF_ICMPGT,
            other => panic!("`{}` is not a comparison operator", other),
        }
    }

    fn gen_unary(&mut self, un_op: UnaryOp, operand: &Expr) {
        match un_op {
            UnaryOp::Not => {
                let ty = self.types.get(&operand.id).copied();
                match ty {
                    Some(Type::Bool) => {
                        self.gen_expr(operand);
                        self.code.const_int(self.pool, 1);
                        self.code.op(op::IXOR);
                    }
                    Some(Type::Int) => {
                        self.gen_expr(operand);
                        self.code.const_int(self.pool, -1);
                        self.code.op(op::IXOR);
                    }
                    other => panic!("unary not applied to unsupported type {:?}", other),
                }
            }
            UnaryOp::Neg => {
                self.gen_expr(operand);
                self.code.op(op::INEG);
            }
        }
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn gen_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>) {
        let then_label = self.code.new_label();
        let end = self.code.new_label();

        if let Some((bin_op, left, right)) = as_comparison(cond) {
            // Comparison conditions fuse into the branch itself
            self.gen_comparison(
                bin_op,
                left,
                right,
                |g| g.gen_block(then_block),
                |g| {
                    if let Some(alt) = else_block {
                        g.gen_block(alt);
                    }
                },
            );
        } else {
            self.gen_expr(cond);

            self.code.jump(op::IFNE, then_label);
            self.stack.forget(1);

            if let Some(alt) = else_block {
                self.gen_block(alt);
            }
            self.code.jump(op::GOTO, end);

            self.code.bind(then_label);
            self.gen_block(then_block);
        }

        let target = self
            .types
            .get(&then_block.id)
            .copied()
            .unwrap_or_else(|| panic!("no type recorded for node {:?}", then_block.id));
        if target != Type::Unit {
            assert!(else_block.is_some(), "`if` producing a value without `else`");

            // Both arms pushed one value onto the model but only one arm
            // executes, so drop the double-counted entry.
            self.stack.forget(1);
        }

        self.code.bind(end);
    }

    fn gen_while(&mut self, cond: &Expr, body: &Block) {
        let mark = self.stack.size();

        let continue_label = self.code.new_label();
        let break_label = self.code.new_label();
        self.vars.enter_loop(break_label);

        self.code.bind(continue_label);

        if let Some((bin_op, left, right)) = as_comparison(cond) {
            // Fused: leave the loop when the comparison fails
            self.gen_expr(left);
            self.gen_expr(right);
            let opcode = negate(self.comparison_op(bin_op, left));
            self.code.jump(opcode, break_label);
            self.stack.forget(2);
        } else {
            self.gen_expr(cond);
            self.code.jump(op::IFEQ, break_label);
            self.stack.forget(1);
        }

        self.gen_block(body);

        self.code.jump(op::GOTO, continue_label);

        self.code.bind(break_label);

        assert!(mark == self.stack.size(), "loop body unbalanced the operand stack");
    }
}

/// A comparison condition eligible for branch fusion.
fn as_comparison(cond: &Expr) -> Option<(BinOp, &Expr, &Expr)> {
    match &cond.kind {
        ExprKind::Binary { op, left, right } if op.kind() == OpKind::Comparison => {
            Some((*op, left, right))
        }
        _ => None,
    }
}

/// Invert a conditional jump.
fn negate(opcode: u8) -> u8 {
    match opcode {
        op::IF_ICMPEQ => op::IF_ICMPNE,
        op::IF_ICMPNE => op::IF_ICMPEQ,
        op::IF_ICMPLT => op::IF_ICMPGE,
        op::IF_ICMPGE => op::IF_ICMPLT,
        op::IF_ICMPGT => op::IF_ICMPLE,
        op::IF_ICMPLE => op::IF_ICMPGT,
        op::IF_ACMPEQ => op::IF_ACMPNE,
        op::IF_ACMPNE => op::IF_ACMPEQ,
        other => panic!("opcode 0x{:02x} is not a conditional jump", other),
    }
}
