// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! End-to-end driver tests: whole programs in, verified class files or
//! ordered diagnostics out. Execution of the produced classes is a host
//! concern and stays outside these tests; they assert on artifact structure
//! and on the exact errors a failed compile reports.

use kiln_ast::LineMap;
use kiln_cli::{compile, CompileFailure};

fn build(source: &str) -> Result<Vec<u8>, CompileFailure> {
    compile(source, "Test")
}

/// Resolve a diagnostic's position as (line, column).
fn location_of(source: &str, failure: &CompileFailure, index: usize) -> (u32, u32) {
    let span = failure.diagnostics[index].span.expect("diagnostic has no span");
    LineMap::new(source).location(span.start)
}

#[test]
fn arithmetic_round_trip_artifact() {
    let bytes = build("fn main() { println(2 + 3); }").expect("compilation failed");

    // A verified class file with the expected shape: magic, version 52,
    // the builtin plumbing, and the generated entry point
    assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
    assert_eq!(&bytes[4..8], &[0, 0, 0, 52]);
    let has = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(has(b"java/lang/System"));
    assert!(has(b"println"));
    assert!(has(b"main"));
    assert!(has(b"([Ljava/lang/String;)V"));
}

#[test]
fn if_statement_needs_no_else_but_if_value_does() {
    build("fn main() { let x: int = 1; if x == 1 { } else { } }").expect("statement if failed");
    build("fn main() { let x: int = 1; if x == 1 { } }").expect("else-less statement if failed");

    build("fn main() { let x: int = 1; let y: int = if x == 1 { 1 } else { 2 }; }")
        .expect("value if failed");

    let failure = build("fn main() { let x: int = 1; let y: int = if x == 1 { 1 }; }")
        .expect_err("else-less value if must fail");
    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics[0].message, "missing else clause");
}

#[test]
fn bare_return_where_int_expected() {
    let source = "fn f() -> int { return; }\nfn main() { }";
    let failure = build(source).expect_err("must fail");

    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(
        failure.diagnostics[0].message,
        "type mismatch: expected int, got ()"
    );
    // At the missing value, line 1 right before the `;`
    assert_eq!(location_of(source, &failure, 0), (1, 23));
}

#[test]
fn redeclared_constant_reports_one_error_at_the_second_site() {
    let source = "const N: int = 1;\nconst N: int = 1;\nfn main() { }";
    let failure = build(source).expect_err("must fail");

    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics[0].message, "cannot redeclare `N`");
    assert_eq!(location_of(source, &failure, 0), (2, 1));
}

#[test]
fn break_outside_loop_reports_once_with_no_cascades() {
    let source = "fn main() { break; }";
    let failure = build(source).expect_err("must fail");

    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics[0].message, "`break` outside of loop");
    assert_eq!(location_of(source, &failure, 0), (1, 13));
}

#[test]
fn missing_main_is_reported() {
    let failure = build("fn helper() { }").expect_err("must fail");
    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics[0].message, "main function not found");
    assert!(failure.diagnostics[0].span.is_none());
}

#[test]
fn batch_stages_report_every_independent_error() {
    let source = "fn main() {\n    alpha;\n    beta;\n}";
    let failure = build(source).expect_err("must fail");

    assert_eq!(failure.diagnostics.len(), 2);
    assert_eq!(failure.diagnostics[0].message, "variable `alpha` not declared");
    assert_eq!(failure.diagnostics[1].message, "variable `beta` not declared");
    assert_eq!(location_of(source, &failure, 0), (2, 5));
    assert_eq!(location_of(source, &failure, 1), (3, 5));
}

#[test]
fn lexical_errors_are_fatal_and_singular() {
    let failure = build("fn main() { let § = 1; let ¶ = 2; }").expect_err("must fail");
    assert_eq!(failure.diagnostics.len(), 1);
    assert!(failure.diagnostics[0].message.contains("unexpected character"));
}

#[test]
fn recompilation_is_byte_identical() {
    let source = "static COUNT: int = 3;\n\
                  const LIMIT: int = 10;\n\
                  fn step(n: int) -> int { n + COUNT }\n\
                  fn main() {\n\
                      let i: int = 0;\n\
                      while i < LIMIT {\n\
                          i = step(i);\n\
                      }\n\
                      println(i);\n\
                  }";
    let first = build(source).expect("compilation failed");
    let second = build(source).expect("compilation failed");
    assert_eq!(first, second);
}

#[test]
fn a_larger_program_compiles() {
    let source = "const BASE: int = 0;\n\
                  static STEP: int = 1;\n\
                  fn mul(a: int, b: int) -> int {\n\
                      let i: int = BASE;\n\
                      while i < 10 {\n\
                          b += if b > 0 { b * 4 } else { -8 };\n\
                          a -= i * (2 + 2);\n\
                          i += STEP;\n\
                      }\n\
                      return i;\n\
                  }\n\
                  fn main() { println(mul(3, 5)); }";
    build(source).expect("compilation failed");
}

#[test]
fn no_artifact_semantics_on_failure() {
    // The driver returns only diagnostics on failure; there are no bytes to
    // accidentally write
    let failure = build("fn main() { undeclared; }").expect_err("must fail");
    assert!(!failure.diagnostics.is_empty());
    assert!(failure.to_string().contains("compilation failed"));
}
