//! Conversion of process outcomes into MCP tool results.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};

use super::{InvokeError, ProcessResult, TranslateError};

/// Exit code zero yields the raw stdout; anything else is a tool error
/// carrying the diagnostic output.
pub fn format_result(result: &ProcessResult) -> CallToolResult {
    if result.success() {
        let stdout = String::from_utf8_lossy(&result.stdout).into_owned();
        return CallToolResult::success(vec![Content::text(stdout)]);
    }

    CallToolResult::error(vec![Content::text(failure_message(result))])
}

fn failure_message(result: &ProcessResult) -> String {
    let mut message = match result.exit_code {
        Some(code) => format!("Codex exited with status {}", code),
        None => "Codex was terminated by a signal".to_string(),
    };

    let stderr = String::from_utf8_lossy(&result.stderr);
    let stdout = String::from_utf8_lossy(&result.stdout);
    let diagnostic = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    if !diagnostic.trim().is_empty() {
        message.push_str(":\n");
        message.push_str(&diagnostic);
    }

    message.push_str("\n\nCommand: ");
    message.push_str(&result.command);
    message
}

/// Map an invocation failure onto the protocol.
///
/// A missing binary is a configuration error and spawn failures are internal
/// errors; a timeout is reported as a failed tool call.
pub fn format_invoke_error(err: InvokeError) -> Result<CallToolResult, McpError> {
    match err {
        InvokeError::TimedOut { .. } => Ok(CallToolResult::error(vec![Content::text(
            err.to_string(),
        )])),
        err if err.is_configuration() => Err(McpError::internal_error(
            format!("Configuration error: {}", err),
            None,
        )),
        err => Err(McpError::internal_error(err.to_string(), None)),
    }
}

pub fn translate_error(err: TranslateError) -> McpError {
    match err {
        TranslateError::TempFile(_) => McpError::internal_error(err.to_string(), None),
        _ => McpError::invalid_params(err.to_string(), None),
    }
}
