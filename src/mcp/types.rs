use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::codex::{ApprovalMode, TaskType};
use crate::session::{SessionClosed, SessionReply, SessionSummary};

// ============================================================
// Tool Parameters
// ============================================================

/// Parameters for codex_agent
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct AgentParams {
    /// The task or question to send to Codex
    pub prompt: String,
    /// Type of task, selects a prompt template (default: general)
    #[serde(default)]
    pub task_type: TaskType,
    /// Model to use, e.g. o4-mini, o3, gpt-4.1 (default: o4-mini)
    #[serde(default)]
    pub model: Option<String>,
    /// AI provider: openai, azure, openrouter, gemini, ollama, mistral, deepseek, xai, groq, arceeai
    #[serde(default)]
    pub provider: Option<String>,
    /// Agent autonomy level: suggest (default), auto-edit, or full-auto
    #[serde(default)]
    pub approval_mode: Option<ApprovalMode>,
    /// Image paths or data URIs to include for multimodal tasks
    #[serde(default)]
    pub images: Option<Vec<String>>,
    /// Ask Codex for structured JSON output
    #[serde(default)]
    pub json_output: bool,
    /// Extra command-line arguments passed to Codex verbatim
    #[serde(default)]
    pub additional_args: Option<Vec<String>>,
}

/// Parameters for codex_interactive
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct InteractiveParams {
    /// Optional first message of the session
    #[serde(default)]
    pub initial_prompt: Option<String>,
    /// Model to use (default: o4-mini)
    #[serde(default)]
    pub model: Option<String>,
    /// AI provider to use
    #[serde(default)]
    pub provider: Option<String>,
    /// Agent autonomy level: suggest (default), auto-edit, or full-auto
    #[serde(default)]
    pub approval_mode: Option<ApprovalMode>,
}

/// Parameters for codex_session_send
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SessionSendParams {
    /// Session id returned by codex_interactive
    pub session_id: String,
    /// Message written to the session as one line of input
    pub message: String,
}

/// Parameters for codex_session_close
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SessionCloseParams {
    /// Session id returned by codex_interactive
    pub session_id: String,
}

// ============================================================
// Session Results
// ============================================================

/// Result of codex_interactive and codex_session_send
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionReplyDto {
    pub session_id: String,
    pub command: String,
    /// Everything the session printed since the last message
    pub output: String,
    /// False once the Codex process has exited
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl From<SessionReply> for SessionReplyDto {
    fn from(r: SessionReply) -> Self {
        Self {
            session_id: r.session_id,
            command: r.command,
            output: r.output,
            running: r.running,
            exit_code: r.exit_code,
        }
    }
}

/// Result of codex_session_close
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionClosedDto {
    pub session_id: String,
    pub exit_code: Option<i32>,
    /// Output printed after the last message
    pub output: String,
}

impl From<SessionClosed> for SessionClosedDto {
    fn from(c: SessionClosed) -> Self {
        Self {
            session_id: c.session_id,
            exit_code: c.exit_code,
            output: c.output,
        }
    }
}

/// Result of codex_session_list
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResult {
    pub max_sessions: usize,
    pub sessions: Vec<SessionInfo>,
}

/// A single live session
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub age_secs: u64,
    /// Absent while the session is busy answering a message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_secs: Option<u64>,
}

impl From<SessionSummary> for SessionInfo {
    fn from(s: SessionSummary) -> Self {
        Self {
            session_id: s.session_id,
            command: s.command,
            pid: s.pid,
            age_secs: s.age.as_secs(),
            idle_secs: s.idle.map(|d| d.as_secs()),
        }
    }
}
