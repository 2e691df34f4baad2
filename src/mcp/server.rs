use std::sync::Arc;

use anyhow::Result;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;

use crate::{
    codex::{
        AgentRequest, InteractiveRequest, invoker, response, translate_agent,
        translate_interactive,
    },
    config::Settings,
    session::{SessionError, SessionLimits, SessionManager},
};

use super::Transport;
use super::types::{
    AgentParams, InteractiveParams, SessionCloseParams, SessionClosedDto, SessionInfo,
    SessionListResult, SessionReplyDto, SessionSendParams,
};

#[derive(Clone)]
pub struct CodexMcpServer {
    settings: Arc<Settings>,
    sessions: SessionManager,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CodexMcpServer {
    pub fn new(settings: Settings) -> Self {
        let sessions = SessionManager::new(SessionLimits::from_settings(&settings));
        Self {
            settings: Arc::new(settings),
            sessions,
            tool_router: Self::tool_router(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run Codex once, non-interactively, and return its output
    #[tool(
        description = "Run the OpenAI Codex CLI coding agent on a task and return its output. Supports task-specific prompt templates (general, code-generation, code-explanation, debugging, refactoring, testing, security, documentation), model and provider selection, approval modes (suggest, auto-edit, full-auto) and image inputs."
    )]
    pub async fn codex_agent(
        &self,
        params: Parameters<AgentParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let config = &self.settings.config;

        let request = AgentRequest {
            prompt: params.prompt,
            task_type: params.task_type,
            model: params.model.or_else(|| Some(config.default_model.clone())),
            provider: params.provider.or_else(|| config.default_provider.clone()),
            approval_mode: params
                .approval_mode
                .unwrap_or(config.default_approval_mode),
            images: params.images.unwrap_or_default(),
            json_output: params.json_output,
            additional_args: params.additional_args.unwrap_or_default(),
        };

        let spec = translate_agent(&self.settings, &request).map_err(response::translate_error)?;

        match invoker::run(&spec, self.settings.timeout()).await {
            Ok(result) => {
                if !result.success() {
                    tracing::warn!(exit_code = ?result.exit_code, "codex_agent failed");
                }
                Ok(response::format_result(&result))
            }
            Err(err) => response::format_invoke_error(err),
        }
    }

    /// Start a long-lived interactive Codex session
    #[tool(
        description = "Start an interactive Codex session that stays alive between calls. Returns a sessionId and the session's first output. Continue with codex_session_send and end with codex_session_close."
    )]
    pub async fn codex_interactive(
        &self,
        params: Parameters<InteractiveParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let config = &self.settings.config;

        let request = InteractiveRequest {
            initial_prompt: params.initial_prompt,
            model: params.model.or_else(|| Some(config.default_model.clone())),
            provider: params.provider.or_else(|| config.default_provider.clone()),
            approval_mode: params
                .approval_mode
                .unwrap_or(config.default_approval_mode),
        };
        let spec = translate_interactive(&self.settings, &request);

        match self.sessions.start(&spec).await {
            Ok(reply) => json_result(&SessionReplyDto::from(reply)),
            Err(err) => session_error(err),
        }
    }

    /// Send a message to an interactive session
    #[tool(
        description = "Send one line of input to an interactive Codex session and return what it printed in response."
    )]
    pub async fn codex_session_send(
        &self,
        params: Parameters<SessionSendParams>,
    ) -> Result<CallToolResult, McpError> {
        let SessionSendParams {
            session_id,
            message,
        } = params.0;

        match self.sessions.send(&session_id, &message).await {
            Ok(reply) => json_result(&SessionReplyDto::from(reply)),
            Err(err) => session_error(err),
        }
    }

    /// Terminate an interactive session
    #[tool(description = "Terminate an interactive Codex session and return its exit status.")]
    pub async fn codex_session_close(
        &self,
        params: Parameters<SessionCloseParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.sessions.close(&params.0.session_id).await {
            Ok(closed) => json_result(&SessionClosedDto::from(closed)),
            Err(err) => session_error(err),
        }
    }

    /// List live interactive sessions
    #[tool(description = "List the interactive Codex sessions that are currently alive.")]
    pub async fn codex_session_list(&self) -> Result<CallToolResult, McpError> {
        let result = SessionListResult {
            max_sessions: self.sessions.limits().max_sessions,
            sessions: self
                .sessions
                .list()
                .into_iter()
                .map(SessionInfo::from)
                .collect(),
        };
        json_result(&result)
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json_str = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;

    Ok(CallToolResult::success(vec![Content::text(json_str)]))
}

fn session_error(err: SessionError) -> Result<CallToolResult, McpError> {
    match err {
        SessionError::NotFound { .. } => Err(McpError::invalid_params(err.to_string(), None)),
        SessionError::Invoke(err) => response::format_invoke_error(err),
        err => Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
    }
}

#[tool_handler]
impl ServerHandler for CodexMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Codex MCP gives AI assistants access to the OpenAI Codex CLI coding agent.\n\n\
                 Available tools:\n\
                 1. codex_agent - Run Codex once on a task and return its output\n\
                 2. codex_interactive - Start a long-lived Codex session\n\
                 3. codex_session_send - Send a message to a session\n\
                 4. codex_session_close - Terminate a session\n\
                 5. codex_session_list - List live sessions\n\n\
                 Approval modes:\n\
                 - suggest: only suggests changes (default, safest)\n\
                 - auto-edit: edits files automatically, asks before shell commands\n\
                 - full-auto: full autonomy inside a network-disabled sandbox\n\n\
                 Prefer codex_agent for one-off tasks. Set task_type to get a prompt\n\
                 tailored to code-generation, debugging, refactoring and so on."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Entry point for MCP server
pub fn run_server(settings: Settings, transport: Transport) -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async {
            match transport {
                Transport::Stdio => {
                    tracing::info!("Starting Codex MCP server in stdio mode");
                    let service = CodexMcpServer::new(settings);
                    let server = service.serve(rmcp::transport::stdio()).await?;
                    server.waiting().await?;
                }
                Transport::Sse { host, port } => {
                    super::sse::serve(settings, &host, port).await?;
                }
            }
            Ok(())
        })
}
