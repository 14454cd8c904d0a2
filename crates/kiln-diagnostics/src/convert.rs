// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from each stage's error type to `Diagnostic`.

use crate::{Diagnostic, ToDiagnostic};

impl ToDiagnostic for kiln_lexer::LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        let mut diagnostic = Diagnostic::error(self.message.clone()).with_span(self.span);
        if let Some(hint) = &self.hint {
            diagnostic = diagnostic.with_hint(hint.clone());
        }
        diagnostic
    }
}

impl ToDiagnostic for kiln_parser::ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        let mut diagnostic = Diagnostic::error(self.message.clone()).with_span(self.span);
        if let Some(hint) = &self.hint {
            diagnostic = diagnostic.with_hint(hint.clone());
        }
        diagnostic
    }
}

impl ToDiagnostic for kiln_semck::SemckError {
    fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string());
        match self.span() {
            Some(span) => diagnostic.with_span(span),
            None => diagnostic,
        }
    }
}

impl ToDiagnostic for kiln_symbols::ResolveError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).with_span(self.span())
    }
}

impl ToDiagnostic for kiln_types::TypeError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).with_span(self.span())
    }
}

impl ToDiagnostic for kiln_codegen::CodegenError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
    }
}
