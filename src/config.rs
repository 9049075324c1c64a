//! Server configuration, read once at startup and passed to the log store.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::store::AppendPolicy;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_FILE_NAME: &str = "gallery.csv";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_APPEND_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{key} not set")]
    Missing { key: &'static str },
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Bearer token. Its `Debug` output never shows the secret.
#[derive(Clone, PartialEq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GistConfig {
    pub api_base: String,
    pub gist_id: String,
    pub file_name: String,
    pub token: Credential,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Gist(GistConfig),
    Local { dir: PathBuf, file_name: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub timeout: Duration,
    pub policy: AppendPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing { key });

        let file_name = get("GIST_FILE_NAME").unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let kind = get("GALLERY_BACKEND").unwrap_or_else(|| {
            let inferred = if get("GIST_ID").is_some() { "gist" } else { "local" };
            inferred.to_string()
        });
        let backend = match kind.to_ascii_lowercase().as_str() {
            "gist" => BackendConfig::Gist(GistConfig {
                api_base: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                gist_id: required("GIST_ID")?,
                file_name,
                token: Credential::new(required("GITHUB_TOKEN")?),
            }),
            "local" => BackendConfig::Local {
                dir: get("GALLERY_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_data_dir),
                file_name,
            },
            "memory" => BackendConfig::Memory,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "GALLERY_BACKEND",
                    value: kind,
                });
            }
        };

        let timeout_secs = parse_or(
            "GALLERY_HTTP_TIMEOUT_SECS",
            get("GALLERY_HTTP_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let max_attempts = parse_or(
            "GALLERY_APPEND_ATTEMPTS",
            get("GALLERY_APPEND_ATTEMPTS"),
            DEFAULT_APPEND_ATTEMPTS,
        )?;
        let policy = match get("GALLERY_APPEND_MODE").as_deref() {
            None | Some("optimistic") => AppendPolicy::Optimistic { max_attempts },
            Some("unchecked") => AppendPolicy::Unchecked,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "GALLERY_APPEND_MODE",
                    value: other.to_string(),
                });
            }
        };

        Ok(AppConfig {
            backend,
            timeout: Duration::from_secs(timeout_secs),
            policy,
        })
    }
}

fn parse_or<T: std::str::FromStr + PartialOrd + Default>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => match v.parse::<T>() {
            Ok(n) if n > T::default() => Ok(n),
            _ => Err(ConfigError::Invalid { key, value: v }),
        },
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(feature = "server")]
    {
        if let Some(dirs) = directories::ProjectDirs::from("com", "GistGallery", "GistGallery") {
            return dirs.data_dir().to_path_buf();
        }
    }
    PathBuf::from("data")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn gist_id_selects_gist_backend_with_defaults() {
        let cfg = config(&[("GIST_ID", "abc"), ("GITHUB_TOKEN", " secret ")]).unwrap();
        assert_eq!(
            cfg.backend,
            BackendConfig::Gist(GistConfig {
                api_base: "https://api.github.com".to_string(),
                gist_id: "abc".to_string(),
                file_name: "gallery.csv".to_string(),
                token: Credential::new("secret"),
            })
        );
        assert_eq!(cfg.timeout, Duration::from_secs(15));
        assert_eq!(cfg.policy, AppendPolicy::Optimistic { max_attempts: 5 });
    }

    #[test]
    fn gist_backend_requires_token() {
        assert_eq!(
            config(&[("GIST_ID", "abc"), ("GITHUB_TOKEN", "  ")]),
            Err(ConfigError::Missing { key: "GITHUB_TOKEN" })
        );
        assert_eq!(
            config(&[("GALLERY_BACKEND", "gist")]),
            Err(ConfigError::Missing { key: "GIST_ID" })
        );
    }

    #[test]
    fn local_backend_is_the_fallback() {
        let cfg = config(&[("GALLERY_DATA_DIR", "/tmp/gallery"), ("GIST_FILE_NAME", "log.csv")]).unwrap();
        assert_eq!(
            cfg.backend,
            BackendConfig::Local {
                dir: PathBuf::from("/tmp/gallery"),
                file_name: "log.csv".to_string(),
            }
        );
    }

    #[test]
    fn append_mode_and_numbers_are_validated() {
        let cfg = config(&[
            ("GALLERY_BACKEND", "memory"),
            ("GALLERY_APPEND_MODE", "unchecked"),
            ("GALLERY_HTTP_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.policy, AppendPolicy::Unchecked);
        assert_eq!(cfg.timeout, Duration::from_secs(3));

        assert!(matches!(
            config(&[("GALLERY_BACKEND", "memory"), ("GALLERY_APPEND_MODE", "merge")]),
            Err(ConfigError::Invalid { key: "GALLERY_APPEND_MODE", .. })
        ));
        assert!(matches!(
            config(&[("GALLERY_BACKEND", "memory"), ("GALLERY_HTTP_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { key: "GALLERY_HTTP_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            config(&[("GALLERY_BACKEND", "s3")]),
            Err(ConfigError::Invalid { key: "GALLERY_BACKEND", .. })
        ));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let token = Credential::new("ghp_supersecret");
        assert_eq!(format!("{token:?}"), "Credential(***)");
        assert_eq!(token.expose(), "ghp_supersecret");
    }
}
