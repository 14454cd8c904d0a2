// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The compilation driver.
//!
//! Runs the pipeline strictly forward (lex, parse, semantic checks, symbol
//! resolution, type checking, code generation), aborting with the collected
//! diagnostics at the first stage that fails. A failed compilation produces
//! no artifact.

use std::fmt;
use std::path::Path;

use kiln_codegen::ClassGenerator;
use kiln_diagnostics::{Diagnostic, ToDiagnostic};
use kiln_lexer::Lexer;
use kiln_parser::Parser;
use kiln_types::TypeCheck;

/// A failed compilation: every collected error, in discovery order.
#[derive(Debug)]
pub struct CompileFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compilation failed with {} error(s)", self.diagnostics.len())
    }
}

impl std::error::Error for CompileFailure {}

impl CompileFailure {
    fn of(diagnostic: Diagnostic) -> Self {
        Self { diagnostics: vec![diagnostic] }
    }

    fn batch<E: ToDiagnostic>(errors: Vec<E>) -> Self {
        Self {
            diagnostics: errors.iter().map(ToDiagnostic::to_diagnostic).collect(),
        }
    }
}

/// Compile Kiln source into a verified class file.
pub fn compile(source: &str, class_name: &str) -> Result<Vec<u8>, CompileFailure> {
    let tokens = Lexer::new(source)
        .tokenize()
        .map_err(|e| CompileFailure::of(e.to_diagnostic()))?;

    let program = Parser::new(tokens)
        .parse()
        .map_err(|e| CompileFailure::of(e.to_diagnostic()))?;

    let semck_errors = kiln_semck::run(&program);
    if !semck_errors.is_empty() {
        return Err(CompileFailure::batch(semck_errors));
    }

    let table = kiln_symbols::build(&program).map_err(CompileFailure::batch)?;

    let types = TypeCheck::new(&program, &table)
        .run()
        .map_err(CompileFailure::batch)?;

    ClassGenerator::new(&program, &types, class_name)
        .run()
        .map_err(|e| CompileFailure::of(e.to_diagnostic()))
}

/// Derive the output class name from the source file name:
/// `guessing-game.kn` becomes `GuessingGame`.
pub fn class_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    stem.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
