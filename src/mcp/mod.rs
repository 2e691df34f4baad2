//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes the Codex CLI to AI assistants like Claude Desktop as a
//! set of MCP tools.
//!
//! ## Module Structure
//!
//! - `server`: Tool definitions and the server entry point
//! - `sse`: HTTP Server-Sent-Events transport
//! - `types`: Tool parameter and result types

mod server;
pub mod sse;
pub mod types;

pub use server::{CodexMcpServer, run_server};

/// How the server talks to its client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// JSON-RPC over standard input/output.
    Stdio,
    /// Server-Sent Events over HTTP.
    Sse { host: String, port: u16 },
}
