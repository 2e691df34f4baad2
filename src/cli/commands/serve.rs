use std::{env, path::PathBuf};

use anyhow::{Context, Result};

use super::super::{args::ServeArgs, exit_status::ExitStatus};
use crate::{
    codex::locate_binary,
    config::{Settings, load_env_file},
    mcp::run_server,
};

const TOOL_NAMES: &str =
    "codex_agent, codex_interactive, codex_session_send, codex_session_close, codex_session_list";

/// Load the environment and config, check the Codex binary is installed,
/// then serve until the client goes away.
pub fn serve(args: ServeArgs) -> Result<ExitStatus> {
    if let Some(path) = load_env_file(args.env_file.as_deref())? {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    // CODEX_MCP_BIN may come from the .env file loaded above.
    let binary_override = args
        .codex_bin
        .clone()
        .or_else(|| env::var_os("CODEX_MCP_BIN").map(PathBuf::from));

    let working_dir = env::current_dir().context("Failed to determine working directory")?;
    let settings = Settings::load(&working_dir, binary_override)?;

    let binary = locate_binary(settings.binary())?;
    tracing::info!("Using Codex CLI at {}", binary.display());
    tracing::info!("Working directory: {}", working_dir.display());
    tracing::info!("Available tools: {}", TOOL_NAMES);

    run_server(settings, args.transport())?;
    Ok(ExitStatus::Success)
}
