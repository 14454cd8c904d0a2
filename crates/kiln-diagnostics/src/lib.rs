// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Kiln compiler diagnostics.
//!
//! Provides the unified diagnostic type the CLI consumes. Each compiler
//! stage's error type is converted to `Diagnostic` via the `ToDiagnostic`
//! trait, keeping the stage crates lightweight while enabling rich error
//! display.

pub mod convert;
pub mod formatter;
pub mod json;

use kiln_ast::Span;

/// A compiler diagnostic ready for display.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span: None,
            hint: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Convert a compiler error into a displayable diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}
