//! Checks that `break` only appears inside a `while` loop.

use kiln_ast::expr::{Block, Expr, ExprKind};
use kiln_ast::stmt::{Stmt, StmtKind};
use kiln_ast::symbol::SymbolKind;
use kiln_ast::Program;

use crate::SemckError;

pub(crate) fn check(program: &Program, errors: &mut Vec<SemckError>) {
    for symbol in &program.symbols {
        match &symbol.kind {
            SymbolKind::Function(f) => check_block(&f.body, 0, errors),
            SymbolKind::Static(g) | SymbolKind::Const(g) => check_expr(&g.init, 0, errors),
        }
    }
}

fn check_block(block: &Block, depth: u32, errors: &mut Vec<SemckError>) {
    for stmt in &block.stmts {
        check_stmt(stmt, depth, errors);
    }
    check_expr(&block.tail, depth, errors);
}

fn check_stmt(stmt: &Stmt, depth: u32, errors: &mut Vec<SemckError>) {
    match &stmt.kind {
        StmtKind::Let { init, .. } => check_expr(init, depth, errors),
        StmtKind::Expr(e) => check_expr(e, depth, errors),
    }
}

fn check_expr(expr: &Expr, depth: u32, errors: &mut Vec<SemckError>) {
    match &expr.kind {
        ExprKind::While { cond, body } => {
            // The loop's break label is live from the condition onward
            check_expr(cond, depth + 1, errors);
            check_block(body, depth + 1, errors);
        }
        ExprKind::Break => {
            if depth == 0 {
                errors.push(SemckError::BreakOutsideLoop { span: expr.span });
            }
        }
        ExprKind::Assign { left, right } | ExprKind::AssignOp { left, right, .. } => {
            check_expr(left, depth, errors);
            check_expr(right, depth, errors);
        }
        ExprKind::Binary { left, right, .. } => {
            check_expr(left, depth, errors);
            check_expr(right, depth, errors);
        }
        ExprKind::Unary { operand, .. } => check_expr(operand, depth, errors),
        ExprKind::Group(inner) | ExprKind::Return(inner) => check_expr(inner, depth, errors),
        ExprKind::Call { callee, args } => {
            check_expr(callee, depth, errors);
            for arg in args {
                check_expr(arg, depth, errors);
            }
        }
        ExprKind::Block(block) => check_block(block, depth, errors),
        ExprKind::If { cond, then_block, else_block } => {
            check_expr(cond, depth, errors);
            check_block(then_block, depth, errors);
            if let Some(alt) = else_block {
                check_block(alt, depth, errors);
            }
        }
        ExprKind::Literal(_) | ExprKind::Var(_) | ExprKind::Unit => {}
    }
}
