use std::path::PathBuf;
use std::process;

use clap::Args;

/// Wrap width for the emitted stream; newlines carry no semantics.
const LINE_WIDTH: usize = 80;

#[derive(Args)]
pub struct BuildArgs {
    /// Input source file
    pub input: PathBuf,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Label each operation in the output stream
    #[arg(long)]
    pub annotate: bool,
}

pub fn cmd_build(args: BuildArgs) {
    let output = super::compile_or_exit(&args.input, args.annotate);
    let text = if args.annotate {
        // annotated output already carries one operation per line
        let mut text = output.code.trim_start_matches('\n').to_string();
        text.push('\n');
        text
    } else {
        wrap(&output.code, LINE_WIDTH)
    };

    match args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &text) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!("compiled -> {}", path.display());
        }
        None => print!("{}", text),
    }
}

fn wrap(code: &str, width: usize) -> String {
    let mut text = String::with_capacity(code.len() + code.len() / width + 1);
    for (i, ch) in code.chars().enumerate() {
        if i > 0 && i % width == 0 {
            text.push('\n');
        }
        text.push(ch);
    }
    text.push('\n');
    text
}
