//! File-backed document: one named file inside a data directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::store::{DocumentBackend, Snapshot, StoreError, Version};

pub struct LocalDocument {
    path: PathBuf,
    // Held across read-compare-write so `write_if` is atomic within the process.
    write_lock: Mutex<()>,
}

impl LocalDocument {
    pub fn new(dir: impl Into<PathBuf>, file_name: &str) -> Self {
        Self {
            path: dir.into().join(file_name),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_body(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }

    async fn replace(&self, body: String) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))
    }
}

fn version_of(body: Option<&str>) -> Version {
    match body {
        Some(body) => Version(hex::encode(Sha256::digest(body.as_bytes()))),
        None => Version("absent".to_string()),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl DocumentBackend for LocalDocument {
    async fn read(&self) -> Result<Snapshot, StoreError> {
        let body = self.read_body().await?;
        let version = version_of(body.as_deref());
        Ok(Snapshot {
            body,
            version: Some(version),
        })
    }

    async fn write(&self, body: String) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.replace(body).await
    }

    async fn write_if(&self, body: String, expected: Option<&Version>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let current = self.read_body().await?;
        if expected != Some(&version_of(current.as_deref())) {
            return Err(StoreError::Conflict);
        }
        self.replace(body).await
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
