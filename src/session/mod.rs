//! Long-lived interactive Codex sessions.
//!
//! A session keeps one Codex process alive across tool calls: messages are
//! written to its stdin and whatever it prints in response is relayed back.
//! Sessions belong to a single server instance and are killed when it goes
//! away.

mod manager;
mod output;

pub use manager::{
    SessionClosed, SessionError, SessionLimits, SessionManager, SessionReply, SessionSummary,
};
pub use output::{OutputBuffer, spawn_reader};
