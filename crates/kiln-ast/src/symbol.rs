// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Top-level symbol AST nodes.

use crate::expr::{Block, Expr};
use crate::ty::Type;
use crate::{NodeId, Span, Spanned};

/// A top-level symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: NodeId,
    pub kind: SymbolKind,
    pub span: Span,
}

/// The kind of top-level symbol.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// A function definition
    Function(FnDecl),
    /// A mutable global; backed by a real field in the generated class
    Static(GlobalDecl),
    /// An immutable global; inlined at every use site
    Const(GlobalDecl),
}

impl Symbol {
    /// The symbol's declared name.
    pub fn name(&self) -> &str {
        match &self.kind {
            SymbolKind::Function(f) => &f.name.value,
            SymbolKind::Static(g) | SymbolKind::Const(g) => &g.binding.name.value,
        }
    }
}

/// A function definition.
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub name: Spanned<String>,
    pub params: Vec<Binding>,
    pub ret: Type,
    pub body: Block,
}

impl FnDecl {
    /// The function's (parameter types, return type) signature.
    pub fn signature(&self) -> (Vec<Type>, Type) {
        (self.params.iter().map(|b| b.ty.value).collect(), self.ret)
    }
}

/// A `static` or `const` global with its initializer.
///
/// Initializers are restricted to literals by the parser.
#[derive(Debug, Clone)]
pub struct GlobalDecl {
    pub binding: Binding,
    pub init: Expr,
}

/// A name : type pair (function parameter or `let` binding).
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: Spanned<String>,
    pub ty: Spanned<Type>,
    pub span: Span,
}
