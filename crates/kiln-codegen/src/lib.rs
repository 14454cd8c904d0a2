// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Bytecode generation.
//!
//! Emits one class per program: a field per `static`, a `<clinit>` running
//! the static initializers, one instance method per user function, and a
//! static entry-point trampoline. Generation keeps a compile-time model of
//! the operand stack in lock-step with every emitted instruction, so stack
//! depth is always known without executing anything.

mod bytecode;
mod class;
mod gen;
mod stack;
mod vars;

pub use class::ClassGenerator;

use kiln_classfile::VerifyError;
use thiserror::Error;

/// A code generation failure.
///
/// By this stage the program has passed every check, so a failure here is a
/// defect in the compiler itself; it aborts the compile with a diagnostic
/// rather than producing unverifiable output.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("internal compiler error: {0}")]
    Verify(#[from] VerifyError),
}
