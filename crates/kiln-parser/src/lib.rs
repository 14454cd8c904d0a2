// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for the Kiln language.
//!
//! Transforms a token stream into an abstract syntax tree. Top-level symbols
//! and blocks are parsed by recursive descent; expressions use Pratt parsing
//! with binding powers. Parse errors are fatal: the parser cannot recover a
//! consistent tree past a malformed construct, so the first error aborts.

mod parser;

pub use parser::{ParseError, Parser};
