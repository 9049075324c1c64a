//! Log store singleton (server-only). The remote document is the database.
//! Call `init` once at startup; server functions reach the store through `store()`.

use std::sync::{Arc, OnceLock};

use tracing::Level;

use crate::config::{AppConfig, BackendConfig};
use crate::gist::GistDocument;
use crate::local::LocalDocument;
use crate::log;
use crate::memory::MemoryDocument;
use crate::store::{DocumentBackend, LogStore, StoreError};

static STORE: OnceLock<Result<LogStore, String>> = OnceLock::new();

pub fn open(config: AppConfig) -> Result<LogStore, StoreError> {
    let backend: Arc<dyn DocumentBackend> = match config.backend {
        BackendConfig::Gist(gist) => Arc::new(GistDocument::new(gist, config.timeout)?),
        BackendConfig::Local { dir, file_name } => Arc::new(LocalDocument::new(dir, &file_name)),
        BackendConfig::Memory => Arc::new(MemoryDocument::new()),
    };
    Ok(LogStore::new(backend, config.policy))
}

/// Load `.env`, read the configuration, and open the store. Later calls are no-ops.
pub fn init() {
    STORE.get_or_init(|| {
        if let Err(e) = dotenvy::dotenv() {
            log::app_log(Level::DEBUG, format!("No .env loaded: {}", e));
        }
        let opened = AppConfig::from_env()
            .map_err(|e| format!("Configuration error: {}", e))
            .and_then(|config| open(config).map_err(|e| e.to_string()));
        match &opened {
            Ok(store) => log::app_log(
                Level::INFO,
                format!("Log store ready: {} ({:?})", store.describe(), store.policy()),
            ),
            Err(e) => log::app_log(Level::ERROR, format!("Log store unavailable: {}", e)),
        }
        opened
    });
}

pub fn store() -> Result<&'static LogStore, String> {
    init();
    match STORE.get() {
        Some(Ok(store)) => Ok(store),
        Some(Err(e)) => Err(e.clone()),
        None => Err("log store not initialised".to_string()),
    }
}
