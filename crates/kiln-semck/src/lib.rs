// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Standalone semantic checks over the finished AST.
//!
//! Each check is an independent read-only traversal that collects zero or
//! more errors without aborting early; the checks do not short-circuit each
//! other, so one run surfaces every independent problem.

mod break_check;
mod lvalue;
mod main_presence;

use kiln_ast::{Program, Span};
use thiserror::Error;

/// An error found by one of the semantic checks.
#[derive(Debug, Clone, Error)]
pub enum SemckError {
    #[error("main function not found")]
    MissingMain,

    #[error("left-hand side of assignment is not a variable")]
    InvalidAssignTarget { span: Span },

    #[error("`break` outside of loop")]
    BreakOutsideLoop { span: Span },
}

impl SemckError {
    /// The source location of the error, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            SemckError::MissingMain => None,
            SemckError::InvalidAssignTarget { span } | SemckError::BreakOutsideLoop { span } => {
                Some(*span)
            }
        }
    }
}

/// Run all semantic checks, collecting every error.
pub fn run(program: &Program) -> Vec<SemckError> {
    let mut errors = Vec::new();

    main_presence::check(program, &mut errors);
    lvalue::check(program, &mut errors);
    break_check::check(program, &mut errors);

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(src: &str) -> Vec<SemckError> {
        let tokens = kiln_lexer::Lexer::new(src).tokenize().expect("lex failed");
        let program = kiln_parser::Parser::new(tokens).parse().expect("parse failed");
        run(&program)
    }

    #[test]
    fn accepts_a_plain_program() {
        assert!(check("fn main() { let x: int = 1; x = 2; }").is_empty());
    }

    #[test]
    fn missing_main() {
        let errors = check("fn helper() { }");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SemckError::MissingMain));
    }

    #[test]
    fn assignment_to_non_variable() {
        let errors = check("fn main() { 1 = 2; }");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SemckError::InvalidAssignTarget { .. }));
    }

    #[test]
    fn compound_assignment_to_non_variable() {
        let errors = check("fn main() { (1) += 2; }");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SemckError::InvalidAssignTarget { .. }));
    }

    #[test]
    fn break_outside_loop() {
        let errors = check("fn main() { break; }");
        assert_eq!(errors.len(), 1);
        let SemckError::BreakOutsideLoop { span } = &errors[0] else {
            panic!("expected a break error");
        };
        assert_eq!(span.start, 12);
    }

    #[test]
    fn break_inside_loop_is_fine() {
        assert!(check("fn main() { while true { break; } }").is_empty());
    }

    #[test]
    fn break_in_nested_if_inside_loop_is_fine() {
        assert!(check("fn main() { while true { if true { break; } } }").is_empty());
    }

    #[test]
    fn break_after_loop_is_an_error() {
        let errors = check("fn main() { while true { } break; }");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SemckError::BreakOutsideLoop { .. }));
    }

    #[test]
    fn checks_do_not_short_circuit_each_other() {
        let errors = check("fn helper() { 1 = 2; break; }");
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], SemckError::MissingMain));
        assert!(matches!(errors[1], SemckError::InvalidAssignTarget { .. }));
        assert!(matches!(errors[2], SemckError::BreakOutsideLoop { .. }));
    }
}
