pub mod build;
pub mod check;
pub mod run;

use std::path::Path;
use std::process;

use tapec::diagnostic::render_diagnostics;
use tapec::Output;

/// Read a source file, or exit with a message.
pub fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

/// Compile, rendering warnings and any error to stderr. Exits nonzero on
/// the first compile error.
pub fn compile_or_exit(path: &Path, annotate: bool) -> Output {
    let source = read_source(path);
    let filename = path.to_string_lossy();
    match tapec::compile_with_options(&source, annotate) {
        Ok(output) => {
            render_diagnostics(&output.warnings, &filename, &source);
            output
        }
        Err(diagnostic) => {
            diagnostic.render(&filename, &source);
            process::exit(1);
        }
    }
}
