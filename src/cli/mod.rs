//! Command-line interface layer.

use anyhow::{Context, Result};

mod args;
mod commands;
mod exit_status;

pub use args::{Arguments, Command, Mode, ServeArgs};
pub use exit_status::ExitStatus;

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    match args.command {
        Some(Command::Init) => {
            let dir = std::env::current_dir().context("Failed to determine working directory")?;
            commands::init::init(&dir)
        }
        None => commands::serve::serve(args.serve),
    }
}
