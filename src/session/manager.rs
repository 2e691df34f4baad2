use std::{io, sync::Arc, time::Duration};

use dashmap::DashMap;
use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    process::{Child, ChildStdin},
    sync::Mutex,
    time::Instant,
};
use uuid::Uuid;

use super::output::{OutputBuffer, spawn_reader};
use crate::{
    codex::{InvocationSpec, InvokeError, invoker},
    config::Settings,
};

/// How long a closing session gets to exit on its own after stdin closes.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
    /// Quiet period that marks the end of a reply.
    pub settle: Duration,
    pub max_wait: Duration,
}

impl SessionLimits {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_sessions: settings.config.max_sessions,
            idle_timeout: settings.session_idle_timeout(),
            settle: settings.session_settle(),
            max_wait: settings.session_max_wait(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(
        "Session limit reached ({max} live sessions); close one with codex_session_close first"
    )]
    LimitReached { max: usize },
    #[error("No session with id '{id}'")]
    NotFound { id: String },
    #[error("Session '{id}' has already exited ({})", describe_exit(.code))]
    Exited { id: String, code: Option<i32> },
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error("Failed to write to session '{id}': {source}")]
    Write { id: String, source: io::Error },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "terminated by a signal".to_string(),
    }
}

/// Output produced by a session in response to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReply {
    pub session_id: String,
    pub command: String,
    pub output: String,
    pub running: bool,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClosed {
    pub session_id: String,
    pub exit_code: Option<i32>,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub command: String,
    pub pid: Option<u32>,
    pub age: Duration,
    /// `None` while a request is being served.
    pub idle: Option<Duration>,
}

struct SessionEntry {
    command: String,
    pid: Option<u32>,
    started_at: Instant,
    state: Mutex<SessionState>,
}

struct SessionState {
    child: Child,
    stdin: Option<ChildStdin>,
    output: Arc<OutputBuffer>,
    last_active: Instant,
}

/// Exit status of a session that ended on its own, kept until the client
/// closes it or it has been idle for the configured timeout.
#[derive(Debug, Clone, Copy)]
struct ExitRecord {
    code: Option<i32>,
    at: Instant,
}

/// Table of live sessions for one server instance.
///
/// Dropping the last clone kills every remaining session process.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<String, Arc<SessionEntry>>>,
    exited: Arc<DashMap<String, ExitRecord>>,
    limits: SessionLimits,
}

impl SessionManager {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            exited: Arc::new(DashMap::new()),
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Spawn a session for `spec` and wait for its first output.
    pub async fn start(&self, spec: &InvocationSpec) -> Result<SessionReply, SessionError> {
        self.prune();
        if self.sessions.len() >= self.limits.max_sessions {
            return Err(SessionError::LimitReached {
                max: self.limits.max_sessions,
            });
        }

        let mut child = invoker::spawn_interactive(spec)?;
        let output = OutputBuffer::new();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, output.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, output.clone());
        }

        let id = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let entry = Arc::new(SessionEntry {
            command: spec.display(),
            pid: child.id(),
            started_at: now,
            state: Mutex::new(SessionState {
                stdin: child.stdin.take(),
                child,
                output,
                last_active: now,
            }),
        });
        self.sessions.insert(id.clone(), entry.clone());
        tracing::info!(session = %id, pid = ?entry.pid, "interactive session started");

        let mut state = entry.state.lock().await;
        Ok(self.reply(&id, &entry, &mut state).await)
    }

    /// Write `message` as one line to the session's stdin and collect the
    /// answer.
    pub async fn send(&self, id: &str, message: &str) -> Result<SessionReply, SessionError> {
        self.prune();
        let entry = self.get(id)?;
        let mut state = entry.state.lock().await;

        if let Ok(Some(status)) = state.child.try_wait() {
            self.record_exit(id, status.code());
            return Err(SessionError::Exited {
                id: id.to_string(),
                code: status.code(),
            });
        }

        let mut line = message.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }

        let Some(stdin) = state.stdin.as_mut() else {
            return Err(SessionError::Exited {
                id: id.to_string(),
                code: None,
            });
        };
        let written = match stdin.write_all(line.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(err) => Err(err),
        };
        written.map_err(|source| SessionError::Write {
            id: id.to_string(),
            source,
        })?;

        state.last_active = Instant::now();
        Ok(self.reply(id, &entry, &mut state).await)
    }

    /// Terminate the session: stdin is closed first, and the process is
    /// killed if it does not exit within a short grace period.
    pub async fn close(&self, id: &str) -> Result<SessionClosed, SessionError> {
        let Some((_, entry)) = self.sessions.remove(id) else {
            return match self.exited.remove(id) {
                Some((_, record)) => Ok(SessionClosed {
                    session_id: id.to_string(),
                    exit_code: record.code,
                    output: String::new(),
                }),
                None => Err(SessionError::NotFound { id: id.to_string() }),
            };
        };
        let mut state = entry.state.lock().await;

        drop(state.stdin.take());
        let waited = tokio::time::timeout(CLOSE_GRACE, state.child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => Some(status),
            _ => {
                if let Err(err) = state.child.kill().await {
                    tracing::debug!(session = %id, "kill failed: {}", err);
                }
                state.child.try_wait().ok().flatten()
            }
        };

        state
            .output
            .settle(Duration::from_millis(50), Duration::from_millis(500))
            .await;
        let output = state.output.take().await;
        let exit_code = status.and_then(|s| s.code());
        tracing::info!(session = %id, ?exit_code, "interactive session closed");

        Ok(SessionClosed {
            session_id: id.to_string(),
            exit_code,
            output,
        })
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        self.prune();
        let now = Instant::now();
        let mut sessions: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|item| {
                let entry = item.value();
                SessionSummary {
                    session_id: item.key().clone(),
                    command: entry.command.clone(),
                    pid: entry.pid,
                    age: now.duration_since(entry.started_at),
                    idle: entry
                        .state
                        .try_lock()
                        .ok()
                        .map(|state| now.duration_since(state.last_active)),
                }
            })
            .collect();
        sessions.sort_by(|a, b| b.age.cmp(&a.age));
        sessions
    }

    /// Look up a live session. A session that has already exited is
    /// reported with its exit status rather than as unknown.
    fn get(&self, id: &str) -> Result<Arc<SessionEntry>, SessionError> {
        if let Some(entry) = self.sessions.get(id) {
            return Ok(entry.value().clone());
        }
        match self.exited.get(id) {
            Some(record) => Err(SessionError::Exited {
                id: id.to_string(),
                code: record.code,
            }),
            None => Err(SessionError::NotFound { id: id.to_string() }),
        }
    }

    fn record_exit(&self, id: &str, code: Option<i32>) {
        self.sessions.remove(id);
        self.exited.insert(
            id.to_string(),
            ExitRecord {
                code,
                at: Instant::now(),
            },
        );
    }

    async fn reply(
        &self,
        id: &str,
        entry: &SessionEntry,
        state: &mut SessionState,
    ) -> SessionReply {
        state
            .output
            .settle(self.limits.settle, self.limits.max_wait)
            .await;
        let output = state.output.take().await;
        let status = state.child.try_wait().ok().flatten();
        if let Some(status) = status {
            self.record_exit(id, status.code());
            tracing::info!(session = %id, "interactive session exited");
        }

        SessionReply {
            session_id: id.to_string(),
            command: entry.command.clone(),
            output,
            running: status.is_none(),
            exit_code: status.and_then(|s| s.code()),
        }
    }

    /// Retire sessions whose process has exited, kill sessions that have been
    /// idle for longer than the configured timeout, and forget exit records
    /// older than that timeout. Busy sessions are left alone.
    fn prune(&self) {
        let now = Instant::now();
        let stale: Vec<(String, Option<Option<i32>>)> = self
            .sessions
            .iter()
            .filter_map(|item| {
                let mut state = item.value().state.try_lock().ok()?;
                let exit = state.child.try_wait().ok().flatten().map(|s| s.code());
                let idle = now.duration_since(state.last_active) > self.limits.idle_timeout;
                if idle && exit.is_none() {
                    if let Err(err) = state.child.start_kill() {
                        tracing::debug!(session = %item.key(), "kill failed: {}", err);
                    }
                }
                (exit.is_some() || idle).then(|| (item.key().clone(), exit))
            })
            .collect();

        for (id, exit) in stale {
            match exit {
                Some(code) => self.record_exit(&id, code),
                None => {
                    self.sessions.remove(&id);
                }
            }
            tracing::info!(session = %id, "pruned interactive session");
        }

        self.exited
            .retain(|_, record| now.duration_since(record.at) <= self.limits.idle_timeout);
    }
}
