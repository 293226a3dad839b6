use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub struct CheckArgs {
    /// Input source file
    pub input: PathBuf,
}

pub fn cmd_check(args: CheckArgs) {
    let output = super::compile_or_exit(&args.input, false);
    eprintln!(
        "ok: {} primitives{}",
        output
            .code
            .chars()
            .filter(|c| "><+-.,[]".contains(*c))
            .count(),
        if output.warnings.is_empty() {
            String::new()
        } else {
            format!(", {} warning(s)", output.warnings.len())
        }
    );
}
