//! Log store: a remote text document used as an append-only record log.
//!
//! Appending is read-modify-write over the whole document. With
//! [`AppendPolicy::Unchecked`] two writers that read the same body each write
//! back only their own line, and one record is lost. [`AppendPolicy::Optimistic`]
//! writes conditionally on the version that was read and retries on conflict.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::Level;

use crate::codec::{self, CodecError};
use crate::log;
use crate::model::Record;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("file {file:?} not found in document")]
    NotFound { file: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("document changed since it was read")]
    Conflict,
    #[error("gave up after {attempts} conflicting append attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("malformed log: {0}")]
    Format(#[from] CodecError),
    #[error("storage error: {0}")]
    Io(String),
}

/// Opaque version token handed out by a backend read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(pub String);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document state at read time. `body` is `None` when the named file is absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub body: Option<String>,
    pub version: Option<Version>,
}

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn read(&self) -> Result<Snapshot, StoreError>;

    /// Overwrite the whole named file.
    async fn write(&self, body: String) -> Result<(), StoreError>;

    /// Overwrite only if the document is still at `expected`; otherwise `StoreError::Conflict`.
    async fn write_if(&self, body: String, expected: Option<&Version>) -> Result<(), StoreError>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPolicy {
    /// Fetch, then write unconditionally. Concurrent appends can lose records.
    Unchecked,
    Optimistic { max_attempts: u32 },
}

impl Default for AppendPolicy {
    fn default() -> Self {
        AppendPolicy::Optimistic { max_attempts: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPhase {
    Idle,
    Fetching,
    Encoding,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for AppendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppendPhase::Idle => "idle",
            AppendPhase::Fetching => "fetching",
            AppendPhase::Encoding => "encoding",
            AppendPhase::Writing => "writing",
            AppendPhase::Done => "done",
            AppendPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful append.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub line: String,
    pub attempts: u32,
}

struct AppendRun<'a> {
    title: &'a str,
    phase: AppendPhase,
}

impl AppendRun<'_> {
    fn enter(&mut self, next: AppendPhase) {
        tracing::debug!(title = self.title, from = %self.phase, to = %next, "append phase");
        self.phase = next;
    }

    fn fail(&mut self, e: StoreError) -> StoreError {
        log::app_log(
            Level::ERROR,
            format!("Append {:?} failed while {}: {}", self.title, self.phase, e),
        );
        self.enter(AppendPhase::Failed);
        e
    }
}

pub struct LogStore {
    backend: Arc<dyn DocumentBackend>,
    policy: AppendPolicy,
    append_lock: Mutex<()>,
}

impl LogStore {
    pub fn new(backend: Arc<dyn DocumentBackend>, policy: AppendPolicy) -> Self {
        Self {
            backend,
            policy,
            append_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> AppendPolicy {
        self.policy
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Raw document body. Decoding is left to the caller.
    pub async fn fetch(&self) -> Result<String, StoreError> {
        let snapshot = self.backend.read().await?;
        snapshot.body.ok_or_else(|| StoreError::NotFound {
            file: self.backend.describe(),
        })
    }

    /// Decoded history in file order (oldest first). A missing file is an empty log.
    pub async fn records(&self) -> Result<Vec<Record>, StoreError> {
        let body = match self.fetch().await {
            Ok(body) => body,
            Err(StoreError::NotFound { file }) => {
                log::app_log(Level::INFO, format!("Log {file} does not exist yet"));
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(codec::decode(&body)?)
    }

    pub async fn append(&self, title: &str, payload: &Value) -> Result<Completed, StoreError> {
        let mut run = AppendRun {
            title,
            phase: AppendPhase::Idle,
        };
        let completed = match self.policy {
            AppendPolicy::Unchecked => self.append_unchecked(&mut run, payload).await?,
            AppendPolicy::Optimistic { max_attempts } => {
                let _guard = self.append_lock.lock().await;
                self.append_optimistic(&mut run, payload, max_attempts.max(1))
                    .await?
            }
        };
        run.enter(AppendPhase::Done);
        log::app_log(
            Level::INFO,
            format!(
                "Appended {title:?} to {} (attempts: {})",
                self.backend.describe(),
                completed.attempts
            ),
        );
        Ok(completed)
    }

    async fn append_unchecked(
        &self,
        run: &mut AppendRun<'_>,
        payload: &Value,
    ) -> Result<Completed, StoreError> {
        run.enter(AppendPhase::Fetching);
        let snapshot = self.backend.read().await.map_err(|e| run.fail(e))?;
        run.enter(AppendPhase::Encoding);
        let line = codec::encode(run.title, payload);
        let body = append_line(snapshot.body, &line);
        run.enter(AppendPhase::Writing);
        self.backend.write(body).await.map_err(|e| run.fail(e))?;
        Ok(Completed { line, attempts: 1 })
    }

    async fn append_optimistic(
        &self,
        run: &mut AppendRun<'_>,
        payload: &Value,
        max_attempts: u32,
    ) -> Result<Completed, StoreError> {
        for attempt in 1..=max_attempts {
            run.enter(AppendPhase::Fetching);
            let snapshot = self.backend.read().await.map_err(|e| run.fail(e))?;
            run.enter(AppendPhase::Encoding);
            let line = codec::encode(run.title, payload);
            let body = append_line(snapshot.body, &line);
            run.enter(AppendPhase::Writing);
            match self.backend.write_if(body, snapshot.version.as_ref()).await {
                Ok(()) => {
                    return Ok(Completed {
                        line,
                        attempts: attempt,
                    });
                }
                Err(StoreError::Conflict) => {
                    log::app_log(
                        Level::WARN,
                        format!("Append {:?}: conflict on attempt {attempt}, re-reading", run.title),
                    );
                }
                Err(e) => return Err(run.fail(e)),
            }
        }
        Err(run.fail(StoreError::RetriesExhausted {
            attempts: max_attempts,
        }))
    }
}

/// Current body plus one encoded line. An absent or blank body starts from the header.
fn append_line(current: Option<String>, line: &str) -> String {
    let mut body = match current {
        Some(body) if !body.trim().is_empty() => body,
        _ => codec::empty_body(),
    };
    if !body.ends_with('\n') {
        body.push('\n');
    }
    body.push_str(line);
    body
}
