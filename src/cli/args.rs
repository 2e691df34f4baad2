//! CLI argument definitions using clap.
//!
//! Running `codex-mcp` without a subcommand starts the MCP server.
//!
//! ## Commands
//!
//! - (none): Serve MCP over stdio or SSE
//! - `init`: Write a default `.codex-mcp.json` configuration file

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::mcp::Transport;

const EXAMPLES: &str = "\
Examples:
  codex-mcp                           Run in stdio mode (default)
  codex-mcp --mode stdio              Run in stdio mode explicitly
  codex-mcp --mode sse                Run in SSE mode on localhost:8000
  codex-mcp --mode sse --port 8080    Run in SSE mode on port 8080
  codex-mcp init                      Create .codex-mcp.json";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None, after_help = EXAMPLES)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Arguments {
    pub fn verbose(&self) -> bool {
        self.serve.verbose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Standard input/output
    Stdio,
    /// Server-Sent Events over HTTP
    Sse,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Server transport
    #[arg(long, value_enum, default_value_t = Mode::Stdio)]
    pub mode: Mode,

    /// Host address for SSE mode
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Port number for SSE mode
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Codex CLI binary, by name or path (overrides config file)
    #[arg(long, env = "CODEX_MCP_BIN")]
    pub codex_bin: Option<PathBuf>,

    /// Load API credentials from this file instead of .env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl ServeArgs {
    pub fn transport(&self) -> Transport {
        match self.mode {
            Mode::Stdio => Transport::Stdio,
            Mode::Sse => Transport::Sse {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize a new .codex-mcp.json configuration file
    Init,
}
