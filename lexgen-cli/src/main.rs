use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Compiles a rules file into a DFA and writes `tokens.h`/`lexer.cc` into an output directory.
#[derive(Parser, Debug)]
#[command(name = "generator", version, about)]
struct Args {
    /// Directory `tokens.h` and `lexer.cc` are written into.
    out_dir: PathBuf,
    /// Path to the rules file (`NAME PATTERN` per non-empty line).
    rules_path: PathBuf,
    /// Print each parsed rule's name and AST before compiling.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match lexgen::driver::generate(&args.out_dir, &args.rules_path, args.verbose) {
        Ok(_warnings) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
