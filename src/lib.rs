//! tapec compiles a small C-like imperative language into a program for an
//! eight-instruction byte-cell tape machine.
//!
//! The pipeline is a single top-to-bottom pass:
//! tokens → AST → (walker + symbol environment + emitter) → primitive string.

pub mod ast;
pub mod codegen;
pub mod diagnostic;
pub mod emitter;
pub mod interp;
pub mod lexeme;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod span;

use diagnostic::Diagnostic;
use lexer::Lexer;
use parser::Parser;

pub use codegen::Output;

/// Compile a source string to the primitive stream. Stops at the first
/// error; warnings ride along with the successful output.
pub fn compile(source: &str) -> Result<Output, Diagnostic> {
    compile_with_options(source, false)
}

pub fn compile_with_options(source: &str, annotate: bool) -> Result<Output, Diagnostic> {
    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse_program()?;
    codegen::generate(&program, annotate)
}
