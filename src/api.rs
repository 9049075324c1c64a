//! Server functions bridging client UI to the server-side log store.
//! These are callable from both web (WASM) and desktop clients.

use dioxus::prelude::*;
use serde::{Deserialize, Serialize};

use crate::log::LogEntry;
use crate::model::Record;

/// Result of a successful append, as shown in the gallery's save status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub attempts: u32,
}

/// Append one submission to the log.
#[server]
pub async fn append_record(
    title: String,
    payload: serde_json::Value,
) -> Result<SaveReceipt, ServerFnError> {
    let store = crate::db::store().map_err(|e| ServerFnError::new(e))?;
    let done = store
        .append(&title, &payload)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;
    Ok(SaveReceipt {
        attempts: done.attempts,
    })
}

/// Decoded history in file order (oldest first). A log that does not exist yet is empty.
#[server]
pub async fn load_history() -> Result<Vec<Record>, ServerFnError> {
    let store = crate::db::store().map_err(|e| ServerFnError::new(e))?;
    store
        .records()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

/// Server-side activity for the Logs panel.
#[server]
pub async fn server_logs() -> Result<Vec<LogEntry>, ServerFnError> {
    Ok(crate::log::app_logs_snapshot())
}
