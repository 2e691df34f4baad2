use std::process::ExitCode;

/// Exit status of the `codex-mcp` process.
///
/// - `Success` (0): the server shut down cleanly, or the command completed
/// - `Failure` (1): the command refused to run (e.g. config file already exists)
/// - `Error` (2): startup or runtime error (missing Codex binary, bad config, bind failure)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
