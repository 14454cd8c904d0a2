//! Checks that a top-level `main` function exists.

use kiln_ast::symbol::SymbolKind;
use kiln_ast::Program;

use crate::SemckError;

pub(crate) fn check(program: &Program, errors: &mut Vec<SemckError>) {
    let found = program.symbols.iter().any(|symbol| {
        matches!(&symbol.kind, SymbolKind::Function(f) if f.name.value == "main")
    });

    if !found {
        errors.push(SemckError::MissingMain);
    }
}
