//! Launching the Codex binary.

use std::{
    env, io,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use thiserror::Error;
use tokio::process::{Child, Command};

use super::InvocationSpec;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(
        "'{name}' command not found; install the Codex CLI (npm install -g @openai/codex) or pass --codex-bin"
    )]
    BinaryNotFound { name: String },
    #[error("Failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("Failed to collect output of {program}: {source}")]
    Wait { program: String, source: io::Error },
    #[error("{program} did not finish within {limit:?} and was killed")]
    TimedOut { program: String, limit: Duration },
}

impl InvokeError {
    /// Errors caused by server setup rather than by the request.
    pub fn is_configuration(&self) -> bool {
        matches!(self, InvokeError::BinaryNotFound { .. })
    }
}

/// Captured outcome of one finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub command: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Resolve `program` to an executable file.
///
/// Paths with a directory component are checked as given; bare names are
/// searched for on `PATH`.
pub fn locate_binary(program: &Path) -> Result<PathBuf, InvokeError> {
    let not_found = || InvokeError::BinaryNotFound {
        name: program.to_string_lossy().into_owned(),
    };

    if program.as_os_str().is_empty() {
        return Err(not_found());
    }

    if program.components().count() > 1 {
        return if is_executable(program) {
            Ok(program.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let path_var = env::var_os("PATH").ok_or_else(not_found)?;
    env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(not_found)
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    let exts = env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT".to_string());
    std::iter::once(dir.join(program))
        .chain(exts.split(';').map(|ext| {
            let mut name = program.as_os_str().to_owned();
            name.push(ext);
            dir.join(name)
        }))
        .collect()
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn command_for(spec: &InvocationSpec, program: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k, v)))
        .current_dir(&spec.working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run `spec` to completion and capture its output.
///
/// The binary is resolved before anything is spawned. If the returned future
/// is dropped, or `timeout` expires, the child is killed.
pub async fn run(
    spec: &InvocationSpec,
    timeout: Option<Duration>,
) -> Result<ProcessResult, InvokeError> {
    let program = locate_binary(&spec.program)?;
    let command_line = spec.display();
    let program_name = spec.program.to_string_lossy().into_owned();

    tracing::info!(cwd = %spec.working_dir.display(), "Executing command: {}", command_line);

    let mut cmd = command_for(spec, &program);
    cmd.stdin(Stdio::null());

    let output = cmd.output();
    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, output).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", program_name, limit);
                return Err(InvokeError::TimedOut {
                    program: program_name,
                    limit,
                });
            }
        },
        None => output.await,
    }
    .map_err(|source| spawn_or_wait_error(&program_name, source))?;

    tracing::debug!(status = ?output.status, "{} finished", program_name);

    Ok(ProcessResult {
        exit_code: output.status.code(),
        stdout: output.stdout,
        stderr: output.stderr,
        command: command_line,
    })
}

fn spawn_or_wait_error(program: &str, source: io::Error) -> InvokeError {
    // `output()` reports spawn failures and pipe failures through the same
    // error; a missing or non-executable file is a spawn failure.
    match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => InvokeError::Spawn {
            program: program.to_string(),
            source,
        },
        _ => InvokeError::Wait {
            program: program.to_string(),
            source,
        },
    }
}

/// Spawn `spec` with all three standard streams piped, for a long-lived
/// interactive session.
pub fn spawn_interactive(spec: &InvocationSpec) -> Result<Child, InvokeError> {
    let program = locate_binary(&spec.program)?;
    tracing::info!(
        cwd = %spec.working_dir.display(),
        "Starting interactive session: {}",
        spec.display()
    );

    let mut cmd = command_for(spec, &program);
    cmd.stdin(Stdio::piped());
    cmd.spawn().map_err(|source| InvokeError::Spawn {
        program: spec.program.to_string_lossy().into_owned(),
        source,
    })
}
