// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The compile-time operand stack model.

use kiln_ast::ty::Type;

/// Tracks what the generated code has pushed, in lock-step with emission.
///
/// The model exists so statement boundaries can restore their entry depth
/// and so value-producing `if` arms can be reconciled; it never looks at
/// the real bytes.
#[derive(Debug, Default)]
pub(crate) struct OperandStack {
    types: Vec<Type>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.types.len()
    }

    /// Record a pushed value.
    pub fn push(&mut self, ty: Type) {
        self.types.push(ty);
    }

    /// Drop entries from the model only; the matching real-stack effect
    /// already happened (a store, a call, a branch consuming operands).
    pub fn forget(&mut self, count: usize) {
        for _ in 0..count {
            self.types
                .pop()
                .expect("operand stack model underflow");
        }
    }
}
