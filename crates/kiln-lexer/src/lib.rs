// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for the Kiln language.
//!
//! Transforms source text into a token stream terminated by a single
//! end-of-file sentinel. Lexical errors are fatal: the token stream cannot be
//! resynchronized past a malformed token, so the first error aborts.

mod lexer;

pub use lexer::{LexError, Lexer};
