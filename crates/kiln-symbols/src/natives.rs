// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The native builtin registry.
//!
//! A fixed table of builtin name → (argument types, return type, emission
//! strategy). The resolver registers these as callable symbols; the code
//! generator selects the matching hand-written instruction sequence by
//! `NativeKind`. New builtins are added only by extending this table.

use kiln_ast::ty::Type;

/// Which hand-written emission strategy a builtin uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    /// Print an integer followed by a newline
    Println,
    /// Integer exponentiation via floating-point `pow`, truncated back
    Pow,
}

/// A builtin function's signature and emission strategy.
#[derive(Debug, Clone, Copy)]
pub struct NativeMethod {
    pub name: &'static str,
    pub params: &'static [Type],
    pub ret: Type,
    pub kind: NativeKind,
}

/// All native builtins, in registration order.
pub const NATIVES: &[NativeMethod] = &[
    NativeMethod {
        name: "println",
        params: &[Type::Int],
        ret: Type::Unit,
        kind: NativeKind::Println,
    },
    NativeMethod {
        name: "pow",
        params: &[Type::Int, Type::Int],
        ret: Type::Int,
        kind: NativeKind::Pow,
    },
];

/// Look up a builtin by name.
pub fn lookup(name: &str) -> Option<&'static NativeMethod> {
    NATIVES.iter().find(|m| m.name == name)
}
