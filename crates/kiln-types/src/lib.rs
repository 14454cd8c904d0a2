// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Bidirectional type checking.
//!
//! Infers types bottom-up where no expectation exists and checks top-down
//! against one where it does. Every checked node's resolved type is recorded
//! by node id for the code generator; the AST itself is never mutated.

mod checker;

pub use checker::{TypeCheck, TypeMap};

use kiln_ast::expr::{BinOp, UnaryOp};
use kiln_ast::ty::Type;
use kiln_ast::Span;
use thiserror::Error;

/// A type error with its source location.
#[derive(Debug, Clone, Error)]
pub enum TypeError {
    #[error("no variable named {name}")]
    NoVariable { name: String, span: Span },

    #[error("no function named {name}")]
    NoFunction { name: String, span: Span },

    #[error("mismatching argument count: expected {expected}, got {got}")]
    ArgCount { expected: usize, got: usize, span: Span },

    #[error("binary operation `{op}` cannot be applied to {ty}")]
    BinaryOperand { op: BinOp, ty: Type, span: Span },

    #[error("unary operation `{op}` cannot be applied to {ty}")]
    UnaryOperand { op: UnaryOp, ty: Type, span: Span },

    #[error("missing else clause")]
    MissingElse { span: Span },

    #[error("missing return value/return statement")]
    MissingReturn { span: Span },

    #[error("type mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: Type, actual: Type, span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::NoVariable { span, .. }
            | TypeError::NoFunction { span, .. }
            | TypeError::ArgCount { span, .. }
            | TypeError::BinaryOperand { span, .. }
            | TypeError::UnaryOperand { span, .. }
            | TypeError::MissingElse { span }
            | TypeError::MissingReturn { span }
            | TypeError::Mismatch { span, .. } => *span,
        }
    }
}
