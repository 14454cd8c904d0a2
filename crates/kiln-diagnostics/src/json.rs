// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Machine-readable diagnostics for editors and tooling.

use kiln_ast::LineMap;
use serde::Serialize;

use crate::{Diagnostic, Severity};

/// One diagnostic with its location resolved to line and column.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic<'a> {
    pub severity: &'static str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'a str>,
}

/// Serialize a batch of diagnostics as a JSON array.
pub fn to_json(diagnostics: &[Diagnostic], line_map: &LineMap) -> String {
    let entries: Vec<JsonDiagnostic> = diagnostics
        .iter()
        .map(|d| {
            let location = d.span.map(|span| line_map.location(span.start));
            JsonDiagnostic {
                severity: match d.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                },
                message: &d.message,
                line: location.map(|(line, _)| line),
                column: location.map(|(_, col)| col),
                hint: d.hint.as_deref(),
            }
        })
        .collect();

    serde_json::to_string_pretty(&entries).expect("diagnostics always serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ast::Span;

    #[test]
    fn resolves_spans_to_locations() {
        let source = "a\nbcd";
        let line_map = LineMap::new(source);
        let diagnostics =
            vec![Diagnostic::error("something is off").with_span(Span::new(3, 4))];

        let json = to_json(&diagnostics, &line_map);
        assert!(json.contains("\"severity\": \"error\""));
        assert!(json.contains("\"line\": 2"));
        assert!(json.contains("\"column\": 2"));
    }
}
