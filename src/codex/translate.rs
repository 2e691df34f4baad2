//! Translation of tool parameters into Codex command lines.

use std::{
    fmt,
    io::{self, Write},
    path::{Path, PathBuf},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::{ApprovalMode, TaskType, provider};
use crate::config::Settings;

/// Environment variable that silences the CLI's interactive UI.
pub const QUIET_MODE_VAR: &str = "CODEX_QUIET_MODE";

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Missing required parameter: prompt")]
    EmptyPrompt,
    #[error("Invalid image #{index}: {reason}")]
    InvalidImage { index: usize, reason: String },
    #[error("Failed to write temporary image file: {0}")]
    TempFile(#[from] io::Error),
}

/// A one-shot agent run, with defaults already resolved.
#[derive(Debug, Clone, Default)]
pub struct AgentRequest {
    pub prompt: String,
    pub task_type: TaskType,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub approval_mode: ApprovalMode,
    pub images: Vec<String>,
    pub json_output: bool,
    pub additional_args: Vec<String>,
}

/// A long-lived interactive session.
#[derive(Debug, Clone, Default)]
pub struct InteractiveRequest {
    pub initial_prompt: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub approval_mode: ApprovalMode,
}

/// Everything needed to launch one Codex process.
///
/// Decoded images are owned here and deleted when the invocation is dropped, so it
/// must outlive the process it describes.
#[derive(Debug)]
pub struct InvocationSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: PathBuf,
    temp_files: Vec<NamedTempFile>,
}

impl InvocationSpec {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: working_dir.into(),
            temp_files: Vec::new(),
        }
    }

    fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn flag(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.arg(flag).arg(value)
    }

    pub fn temp_files(&self) -> impl Iterator<Item = &Path> {
        self.temp_files.iter().map(|f| f.path())
    }

    /// Shell-like rendering of the command line, for logs and results.
    pub fn display(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|arg| quote_arg(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for InvocationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn push_model_and_provider(
    spec: &mut InvocationSpec,
    model: Option<&str>,
    provider_name: Option<&str>,
) {
    if let Some(model) = model.filter(|m| !m.is_empty()) {
        spec.flag("--model", model);
    }
    if let Some(name) = provider_name.filter(|p| !p.is_empty()) {
        provider::check_provider(name);
        spec.flag("--provider", name);
    }
}

/// Build the quiet, one-shot invocation for `codex_agent`.
pub fn translate_agent(
    settings: &Settings,
    request: &AgentRequest,
) -> Result<InvocationSpec, TranslateError> {
    if request.prompt.trim().is_empty() {
        return Err(TranslateError::EmptyPrompt);
    }

    let mut spec = InvocationSpec::new(settings.binary(), &settings.working_dir);
    spec.env.push((QUIET_MODE_VAR.to_string(), "1".to_string()));

    spec.arg("--quiet");
    if request.json_output {
        spec.arg("--json");
    }
    push_model_and_provider(
        &mut spec,
        request.model.as_deref(),
        request.provider.as_deref(),
    );
    let [flag, mode] = request.approval_mode.cli_args();
    spec.flag(flag, mode);

    for (index, image) in request.images.iter().enumerate() {
        let path = match parse_data_uri(image) {
            Some(uri) => {
                let uri = uri.map_err(|reason| TranslateError::InvalidImage { index, reason })?;
                let file = uri.write_temp_file()?;
                let path = file.path().to_string_lossy().into_owned();
                spec.temp_files.push(file);
                path
            }
            None => image.clone(),
        };
        spec.flag("--image", path);
    }

    spec.args.extend(settings.config.extra_args.iter().cloned());
    spec.args.extend(request.additional_args.iter().cloned());
    spec.arg(request.task_type.apply(&request.prompt));

    Ok(spec)
}

/// Build the invocation for an interactive session. The prompt, if any, is
/// passed as the opening message.
pub fn translate_interactive(settings: &Settings, request: &InteractiveRequest) -> InvocationSpec {
    let mut spec = InvocationSpec::new(settings.binary(), &settings.working_dir);
    spec.env.push(("NO_COLOR".to_string(), "1".to_string()));

    push_model_and_provider(
        &mut spec,
        request.model.as_deref(),
        request.provider.as_deref(),
    );
    let [flag, mode] = request.approval_mode.cli_args();
    spec.flag(flag, mode);
    spec.args.extend(settings.config.extra_args.iter().cloned());

    if let Some(prompt) = request
        .initial_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    {
        spec.arg(prompt);
    }

    spec
}

#[derive(Debug, PartialEq, Eq)]
struct DataUri {
    mime: String,
    bytes: Vec<u8>,
}

impl DataUri {
    fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => ".jpg",
            "image/gif" => ".gif",
            "image/webp" => ".webp",
            "image/bmp" => ".bmp",
            _ => ".png",
        }
    }

    fn write_temp_file(&self) -> io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("codex-mcp-image-")
            .suffix(self.extension())
            .tempfile()?;
        file.write_all(&self.bytes)?;
        file.flush()?;
        Ok(file)
    }
}

/// Returns `None` when `input` is not a data URI at all.
fn parse_data_uri(input: &str) -> Option<Result<DataUri, String>> {
    let rest = input.strip_prefix("data:")?;
    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err("data URI has no ',' separator".to_string()));
    };

    let mut parts = meta.split(';');
    let mime = parts
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("image/png")
        .to_ascii_lowercase();
    let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        match STANDARD.decode(payload.trim()) {
            Ok(bytes) => bytes,
            Err(err) => return Some(Err(format!("invalid base64 payload: {}", err))),
        }
    } else {
        payload.as_bytes().to_vec()
    };

    if bytes.is_empty() {
        return Some(Err("data URI payload is empty".to_string()));
    }

    Some(Ok(DataUri { mime, bytes }))
}
