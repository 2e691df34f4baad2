//! Codex MCP - the OpenAI Codex CLI as Model Context Protocol tools
//!
//! Codex MCP lets chat clients such as Claude Desktop call the Codex coding
//! agent as a tool. Tool calls are translated into `codex` command lines, run
//! as subprocesses, and their output is returned as tool results.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `codex`: Argument translation, process invocation and result formatting
//! - `config`: Configuration file and `.env` loading
//! - `logging`: tracing subscriber setup
//! - `mcp`: Model Context Protocol server and transports
//! - `session`: Long-lived interactive Codex sessions

pub mod cli;
pub mod codex;
pub mod config;
pub mod logging;
pub mod mcp;
pub mod session;
