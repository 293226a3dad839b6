mod cli;

use clap::{Parser, Subcommand};

use cli::build::BuildArgs;
use cli::check::CheckArgs;
use cli::run::RunArgs;

#[derive(Parser)]
#[command(
    name = "tapec",
    version,
    about = "Compile a small C-like language to an eight-instruction tape machine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file and print the primitive stream
    Build(BuildArgs),
    /// Compile without printing the program (diagnostics only)
    Check(CheckArgs),
    /// Compile and execute on the reference interpreter
    Run(RunArgs),
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Run(args) => cli::run::cmd_run(args),
    }
}
