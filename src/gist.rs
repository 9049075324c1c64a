//! GitHub gist backend: one named file inside a gist holds the log.
#![cfg_attr(not(feature = "server"), allow(dead_code))]

use std::collections::HashMap;

use serde::Deserialize;

use crate::store::Version;

// ---------------------------------------------------------------------------
// Gist API response types (GET /gists/{id})
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, Option<GistFile>>,
    #[serde(default)]
    history: Vec<GistRevision>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GistRevision {
    version: String,
}

/// What the response says about one named file.
#[derive(Debug, PartialEq)]
enum FileState {
    Absent,
    Inline(String),
    /// Content over the API's inline limit; the full text lives at this URL.
    Truncated(String),
}

impl GistResponse {
    fn version(&self) -> Option<Version> {
        self.history.first().map(|rev| Version(rev.version.clone()))
    }

    fn take_file(&mut self, name: &str) -> FileState {
        match self.files.remove(name).flatten() {
            None => FileState::Absent,
            Some(GistFile {
                truncated: true,
                raw_url: Some(url),
                ..
            }) => FileState::Truncated(url),
            Some(file) => FileState::Inline(file.content.unwrap_or_default()),
        }
    }
}

#[cfg(feature = "server")]
pub use client::GistDocument;

#[cfg(feature = "server")]
mod client {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::header::{ACCEPT, AUTHORIZATION};
    use tracing::Level;

    use super::{FileState, GistResponse};
    use crate::config::GistConfig;
    use crate::log;
    use crate::store::{DocumentBackend, Snapshot, StoreError, Version};

    const USER_AGENT: &str = concat!("gist-gallery/", env!("CARGO_PKG_VERSION"));
    const GITHUB_JSON: &str = "application/vnd.github+json";

    pub struct GistDocument {
        client: reqwest::Client,
        config: GistConfig,
    }

    impl GistDocument {
        pub fn new(config: GistConfig, timeout: Duration) -> Result<Self, StoreError> {
            Self::with_builder(config, reqwest::Client::builder().timeout(timeout))
        }

        fn with_builder(
            config: GistConfig,
            builder: reqwest::ClientBuilder,
        ) -> Result<Self, StoreError> {
            let client = builder
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| StoreError::Network(format!("HTTP client setup failed: {}", e)))?;
            Ok(Self { client, config })
        }

        fn url(&self) -> String {
            format!(
                "{}/gists/{}",
                self.config.api_base.trim_end_matches('/'),
                self.config.gist_id
            )
        }

        fn bearer(&self) -> String {
            format!("Bearer {}", self.config.token.expose())
        }

        async fn get(&self) -> Result<GistResponse, StoreError> {
            let response = self
                .client
                .get(self.url())
                .header(AUTHORIZATION, self.bearer())
                .header(ACCEPT, GITHUB_JSON)
                .send()
                .await
                .map_err(request_failed)?;
            let response = check_status(response).await?;
            response
                .json::<GistResponse>()
                .await
                .map_err(|e| StoreError::Network(format!("Gist response parse failed: {}", e)))
        }

        async fn raw(&self, url: &str) -> Result<String, StoreError> {
            let response = self
                .client
                .get(url)
                .header(AUTHORIZATION, self.bearer())
                .send()
                .await
                .map_err(request_failed)?;
            check_status(response)
                .await?
                .text()
                .await
                .map_err(|e| StoreError::Network(format!("Gist raw read failed: {}", e)))
        }

        async fn patch(&self, body: String) -> Result<(), StoreError> {
            let mut files = serde_json::Map::new();
            files.insert(
                self.config.file_name.clone(),
                serde_json::json!({ "content": body }),
            );
            let payload = serde_json::json!({ "files": files });
            let response = self
                .client
                .patch(self.url())
                .header(AUTHORIZATION, self.bearer())
                .header(ACCEPT, GITHUB_JSON)
                .json(&payload)
                .send()
                .await
                .map_err(request_failed)?;
            check_status(response).await?;
            Ok(())
        }
    }

    fn request_failed(e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Network(format!("Gist request timed out: {}", e))
        } else {
            StoreError::Network(format!("Gist request failed: {}", e))
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::PRECONDITION_FAILED {
            return Err(StoreError::Conflict);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Network(format!("Gist API error: {} - {}", status, body)))
    }

    #[async_trait]
    impl DocumentBackend for GistDocument {
        async fn read(&self) -> Result<Snapshot, StoreError> {
            log::app_log(Level::DEBUG, format!("Gist: GET {}", self.url()));
            let mut gist = self.get().await?;
            let version = gist.version();
            let body = match gist.take_file(&self.config.file_name) {
                FileState::Absent => None,
                FileState::Inline(content) => Some(content),
                FileState::Truncated(url) => {
                    log::app_log(Level::INFO, "Gist: file truncated inline, fetching raw content");
                    Some(self.raw(&url).await?)
                }
            };
            Ok(Snapshot { body, version })
        }

        async fn write(&self, body: String) -> Result<(), StoreError> {
            log::app_log(Level::DEBUG, format!("Gist: PATCH {} ({} bytes)", self.url(), body.len()));
            self.patch(body).await
        }

        /// The gist API has no conditional PATCH, so the version is re-read right
        /// before writing. Writers in this process are serialized by the store.
        async fn write_if(&self, body: String, expected: Option<&Version>) -> Result<(), StoreError> {
            let current = self.get().await?.version();
            if current.as_ref() != expected {
                return Err(StoreError::Conflict);
            }
            self.write(body).await
        }

        fn describe(&self) -> String {
            format!("gist {}/{}", self.config.gist_id, self.config.file_name)
        }
    }

}
