// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for diagnostics.
//!
//! Produces color-coded output with a source excerpt:
//!
//! ```text
//! error: type mismatch: expected int, got bool
//!   --> example.kn:2:18
//!    |
//!  2 |     let y: int = true;
//!    |                  ^^^^
//!    = hint: ...
//! ```

use colored::Colorize;

use kiln_ast::LineMap;

use crate::{Diagnostic, Severity};

/// Formats diagnostics for terminal output.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    line_map: LineMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            file_name: None,
            line_map: LineMap::new(source),
        }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();

        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        out.push_str(&format!("{}: {}\n", severity, diagnostic.message));

        if let Some(span) = diagnostic.span {
            let (line, col) = self.line_map.location(span.start);
            let file = self.file_name.unwrap_or("<source>");
            out.push_str(&format!("  {} {}:{}:{}\n", "-->".blue(), file, line, col));

            if let Some(text) = self.line_map.line_text(self.source, line) {
                let gutter = line.to_string().len().max(2);

                out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
                out.push_str(&format!(
                    "{:>width$} {} {}\n",
                    line.to_string().blue(),
                    "|".blue(),
                    text,
                    width = gutter
                ));

                let col = col as usize;
                let width = (span.end.saturating_sub(span.start)).max(1).min(
                    text.len().saturating_sub(col - 1).max(1),
                );
                out.push_str(&format!(
                    "{} {} {}{}\n",
                    " ".repeat(gutter + 1),
                    "|".blue(),
                    " ".repeat(col - 1),
                    "^".repeat(width).red().bold()
                ));
            }
        }

        if let Some(hint) = &diagnostic.hint {
            out.push_str(&format!("  {} hint: {}\n", "=".blue(), hint));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ast::Span;

    #[test]
    fn formats_location_and_caret() {
        colored::control::set_override(false);

        let source = "fn main() {\n    let y: int = true;\n}";
        let formatter = DiagnosticFormatter::new(source).with_file_name("example.kn");
        let diagnostic = Diagnostic::error("type mismatch: expected int, got bool")
            .with_span(Span::new(29, 33));

        let rendered = formatter.format(&diagnostic);
        assert!(rendered.contains("error: type mismatch"));
        assert!(rendered.contains("example.kn:2:18"));
        assert!(rendered.contains("let y: int = true;"));
        assert!(rendered.contains("^^^^"));
    }

    #[test]
    fn spanless_diagnostics_are_just_the_header() {
        colored::control::set_override(false);

        let formatter = DiagnosticFormatter::new("");
        let rendered = formatter.format(&Diagnostic::error("main function not found"));
        assert_eq!(rendered, "error: main function not found\n");
    }
}
