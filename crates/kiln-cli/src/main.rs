// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Kiln CLI - compiles `.kn` sources to class files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use kiln_ast::LineMap;
use kiln_cli::{class_name_from_path, compile, CompileFailure};
use kiln_diagnostics::formatter::DiagnosticFormatter;
use kiln_diagnostics::json;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let json_mode = args.iter().any(|a| a == "--json");

    match args[1].as_str() {
        "build" => {
            if args.len() < 3 {
                eprintln!("Usage: kiln build <file.kn> [-o <out.class>] [--json]");
                process::exit(1);
            }
            let output = args
                .iter()
                .position(|a| a == "-o")
                .and_then(|i| args.get(i + 1))
                .map(PathBuf::from);
            cmd_build(&args[2], output, json_mode);
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: kiln check <file.kn> [--json]");
                process::exit(1);
            }
            cmd_check(&args[2], json_mode);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("kiln {}", env!("CARGO_PKG_VERSION"));
        }
        other => {
            // Treat a bare filename as `build`
            if other.ends_with(".kn") {
                cmd_build(other, None, json_mode);
            } else {
                eprintln!("Unknown command: {}", other);
                print_usage();
                process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!("Kiln - a small language compiled to class files");
    println!();
    println!("Usage:");
    println!("  kiln build <file.kn> [-o <out.class>] [--json]   Compile to a class file");
    println!("  kiln check <file.kn> [--json]                    Check without emitting");
    println!("  kiln help                                        Show this help");
    println!("  kiln version                                     Show version");
}

fn cmd_build(file: &str, output: Option<PathBuf>, json_mode: bool) {
    let path = Path::new(file);
    let source = read_source(path);
    let class_name = class_name_from_path(path);

    match compile(&source, &class_name) {
        Ok(bytes) => {
            let output = output.unwrap_or_else(|| {
                path.with_file_name(format!("{}.class", class_name))
            });
            if let Err(e) = fs::write(&output, bytes) {
                eprintln!("Failed to write {}: {}", output.display(), e);
                process::exit(1);
            }
            println!("Wrote {}", output.display());
        }
        Err(failure) => {
            report(&failure, &source, file, json_mode);
            process::exit(1);
        }
    }
}

fn cmd_check(file: &str, json_mode: bool) {
    let path = Path::new(file);
    let source = read_source(path);
    let class_name = class_name_from_path(path);

    match compile(&source, &class_name) {
        Ok(_) => println!("{}: no errors found", file),
        Err(failure) => {
            report(&failure, &source, file, json_mode);
            process::exit(1);
        }
    }
}

fn read_source(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn report(failure: &CompileFailure, source: &str, file: &str, json_mode: bool) {
    if json_mode {
        let line_map = LineMap::new(source);
        println!("{}", json::to_json(&failure.diagnostics, &line_map));
        return;
    }

    let formatter = DiagnosticFormatter::new(source).with_file_name(file);
    for diagnostic in &failure.diagnostics {
        eprint!("{}", formatter.format(diagnostic));
    }
    eprintln!("{}", failure);
}
