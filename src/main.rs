use std::process::ExitCode;

use clap::Parser;
use codex_mcp::cli::{Arguments, ExitStatus};

fn main() -> ExitCode {
    let args = Arguments::parse();
    codex_mcp::logging::init(args.verbose());

    match codex_mcp::cli::run_cli(args) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::Error.into()
        }
    }
}
