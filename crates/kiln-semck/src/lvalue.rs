//! Checks that assignment targets are bare variables.

use kiln_ast::expr::{Block, Expr, ExprKind};
use kiln_ast::stmt::{Stmt, StmtKind};
use kiln_ast::symbol::SymbolKind;
use kiln_ast::Program;

use crate::SemckError;

pub(crate) fn check(program: &Program, errors: &mut Vec<SemckError>) {
    for symbol in &program.symbols {
        match &symbol.kind {
            SymbolKind::Function(f) => check_block(&f.body, errors),
            SymbolKind::Static(g) | SymbolKind::Const(g) => check_expr(&g.init, errors),
        }
    }
}

fn check_block(block: &Block, errors: &mut Vec<SemckError>) {
    for stmt in &block.stmts {
        check_stmt(stmt, errors);
    }
    check_expr(&block.tail, errors);
}

fn check_stmt(stmt: &Stmt, errors: &mut Vec<SemckError>) {
    match &stmt.kind {
        StmtKind::Let { init, .. } => check_expr(init, errors),
        StmtKind::Expr(e) => check_expr(e, errors),
    }
}

fn check_expr(expr: &Expr, errors: &mut Vec<SemckError>) {
    match &expr.kind {
        ExprKind::Assign { left, right } | ExprKind::AssignOp { left, right, .. } => {
            if !matches!(left.kind, ExprKind::Var(_)) {
                errors.push(SemckError::InvalidAssignTarget { span: left.span });
            }
            check_expr(left, errors);
            check_expr(right, errors);
        }
        ExprKind::Binary { left, right, .. } => {
            check_expr(left, errors);
            check_expr(right, errors);
        }
        ExprKind::Unary { operand, .. } => check_expr(operand, errors),
        ExprKind::Group(inner) | ExprKind::Return(inner) => check_expr(inner, errors),
        ExprKind::Call { callee, args } => {
            check_expr(callee, errors);
            for arg in args {
                check_expr(arg, errors);
            }
        }
        ExprKind::Block(block) => check_block(block, errors),
        ExprKind::If { cond, then_block, else_block } => {
            check_expr(cond, errors);
            check_block(then_block, errors);
            if let Some(alt) = else_block {
                check_block(alt, errors);
            }
        }
        ExprKind::While { cond, body } => {
            check_expr(cond, errors);
            check_block(body, errors);
        }
        ExprKind::Literal(_) | ExprKind::Var(_) | ExprKind::Break | ExprKind::Unit => {}
    }
}
