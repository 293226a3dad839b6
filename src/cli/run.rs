use std::io;
use std::path::PathBuf;
use std::process;

use clap::Args;

use tapec::interp;

#[derive(Args)]
pub struct RunArgs {
    /// Input source file
    pub input: PathBuf,
    /// Abort after this many machine steps
    #[arg(long)]
    pub max_steps: Option<u64>,
}

pub fn cmd_run(args: RunArgs) {
    let output = super::compile_or_exit(&args.input, false);
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    if let Err(e) = interp::execute(&output.code, &mut stdin, &mut stdout, args.max_steps) {
        eprintln!("runtime error: {}", e);
        process::exit(1);
    }
}
