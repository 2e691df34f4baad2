//! Everything that touches the external Codex CLI.
//!
//! A tool call flows through this module in three steps:
//!
//! 1. `translate`: tool parameters to an [`InvocationSpec`]
//! 2. `invoker`: the invocation is run and its output captured as a [`ProcessResult`]
//! 3. `response`: the result becomes an MCP tool result

mod approval;
pub mod invoker;
pub mod provider;
pub mod response;
mod task;
pub mod translate;

pub use approval::ApprovalMode;
pub use invoker::{InvokeError, ProcessResult, locate_binary};
pub use task::TaskType;
pub use translate::{
    AgentRequest, InteractiveRequest, InvocationSpec, TranslateError, translate_agent,
    translate_interactive,
};
