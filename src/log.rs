//! In-app log buffer for the Logs panel. Every entry is also emitted through `tracing`.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::Level;

const MAX_LOGS: usize = 2000;

static LOG_BUF: std::sync::OnceLock<Mutex<Vec<LogEntry>>> = std::sync::OnceLock::new();

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.level == Level::ERROR.as_str()
    }
}

fn buf() -> &'static Mutex<Vec<LogEntry>> {
    LOG_BUF.get_or_init(|| Mutex::new(Vec::new()))
}

/// Append a log line. Safe to call from any thread (e.g. from async fetch).
pub fn app_log(level: Level, message: impl Into<String>) {
    let message = message.into();
    match level {
        Level::ERROR => tracing::error!("{message}"),
        Level::WARN => tracing::warn!("{message}"),
        Level::INFO => tracing::info!("{message}"),
        Level::DEBUG => tracing::debug!("{message}"),
        _ => tracing::trace!("{message}"),
    }
    let entry = LogEntry {
        time: chrono::Utc::now().format("%H:%M:%S%.3f").to_string(),
        level: level.as_str().to_string(),
        message,
    };
    if let Ok(mut v) = buf().lock() {
        v.push(entry);
        let n = v.len();
        if n > MAX_LOGS {
            v.drain(0..n - MAX_LOGS);
        }
    }
}

/// Take a snapshot of current logs for display. Call from UI.
pub fn app_logs_snapshot() -> Vec<LogEntry> {
    buf().lock().map(|v| v.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_their_level() {
        app_log(Level::ERROR, "log-test: write failed");
        let snapshot = app_logs_snapshot();
        let entry = snapshot
            .iter()
            .rev()
            .find(|e| e.message == "log-test: write failed")
            .unwrap();
        assert!(entry.is_error());
        assert_eq!(entry.level, "ERROR");
    }

    #[test]
    fn buffer_is_capped() {
        for i in 0..MAX_LOGS + 10 {
            app_log(Level::TRACE, format!("cap-test {i}"));
        }
        assert!(app_logs_snapshot().len() <= MAX_LOGS);
    }
}
