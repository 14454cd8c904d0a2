//! Statement AST nodes.

use crate::expr::Expr;
use crate::symbol::Binding;
use crate::{NodeId, Span};

/// A statement in the AST.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

/// The kind of statement.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Let binding (`let name: type = init;`)
    Let { binding: Binding, init: Expr },
    /// Expression statement
    Expr(Expr),
}
