use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::codex::ApprovalMode;

pub const CONFIG_FILE_NAME: &str = ".codex-mcp.json";

pub const DEFAULT_BINARY: &str = "codex";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub default_approval_mode: ApprovalMode,
    /// Arguments appended to every invocation, before per-call arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,
    #[serde(default = "default_session_settle_ms")]
    pub session_settle_ms: u64,
    #[serde(default = "default_session_max_wait_secs")]
    pub session_max_wait_secs: u64,
}

fn default_binary() -> String {
    DEFAULT_BINARY.to_string()
}

fn default_model() -> String {
    "o4-mini".to_string()
}

fn default_max_sessions() -> usize {
    4
}

fn default_session_idle_timeout_secs() -> u64 {
    900
}

fn default_session_settle_ms() -> u64 {
    750
}

fn default_session_max_wait_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            default_model: default_model(),
            default_provider: None,
            default_approval_mode: ApprovalMode::default(),
            extra_args: Vec::new(),
            timeout_secs: None,
            max_sessions: default_max_sessions(),
            session_idle_timeout_secs: default_session_idle_timeout_secs(),
            session_settle_ms: default_session_settle_ms(),
            session_max_wait_secs: default_session_max_wait_secs(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.binary.trim().is_empty(), "'binary' cannot be empty");
        ensure!(self.max_sessions > 0, "'maxSessions' must be at least 1");
        ensure!(
            self.session_settle_ms > 0,
            "'sessionSettleMs' must be at least 1"
        );
        ensure!(
            self.timeout_secs != Some(0),
            "'timeoutSecs' must be at least 1 when set"
        );
        Ok(())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config
                .validate()
                .with_context(|| format!("Invalid config file: {:?}", path))?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}

/// Load provider credentials from a `.env` file into the process environment.
///
/// An explicitly requested file must exist. Without one, `.env` is looked up
/// from the current directory upwards and silently skipped when absent.
pub fn load_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file: {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(err) if err.not_found() => Ok(None),
            Err(err) => Err(err).context("Failed to load .env file"),
        },
    }
}

/// Runtime settings shared by every request a server instance handles.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    /// Directory every subprocess runs in.
    pub working_dir: PathBuf,
}

impl Settings {
    pub fn new(config: Config, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            working_dir: working_dir.into(),
        }
    }

    /// Load the config file reachable from `working_dir` and apply the binary
    /// override from the command line or environment.
    pub fn load(working_dir: &Path, binary_override: Option<PathBuf>) -> Result<Self> {
        let ConfigLoadResult { mut config, .. } = load_config(working_dir)?;
        if let Some(binary) = binary_override {
            config.binary = binary.to_string_lossy().into_owned();
        }
        config.validate()?;
        Ok(Self::new(config, working_dir))
    }

    pub fn binary(&self) -> &Path {
        Path::new(&self.config.binary)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config.timeout_secs.map(Duration::from_secs)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.session_idle_timeout_secs)
    }

    pub fn session_settle(&self) -> Duration {
        Duration::from_millis(self.config.session_settle_ms)
    }

    pub fn session_max_wait(&self) -> Duration {
        Duration::from_secs(self.config.session_max_wait_secs)
    }
}
