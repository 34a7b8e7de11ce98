//! Configuration Management
//!
//! Persistent configuration for the oakpubsub CLI and helpers that turn it
//! into [`ClientOptions`].

use crate::gcp::auth::{self, CredentialSource};
use crate::gcp::client::ClientOptions;
use crate::pubsub::{DEFAULT_CONCURRENCY, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Last used project ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// Service account key file; Application Default Credentials when unset
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// Pub/Sub REST endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Resources requested per page in bulk operations
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Deletions in flight at once in bulk operations
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Per-request timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("oakpubsub").join("config.json"))
    }

    /// Load configuration from disk; a missing or unreadable file gives the defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config file: {}", e);
            Self::default()
        })
    }

    /// Get effective project (config > environment / gcloud default)
    pub fn effective_project(&self) -> Option<String> {
        self.project_id.clone().or_else(auth::get_default_project)
    }

    pub fn effective_page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or(DEFAULT_CONCURRENCY)
    }

    /// Build client options; `project` overrides the configured project.
    /// `PUBSUB_EMULATOR_HOST` takes precedence over endpoint and credentials.
    pub fn client_options(&self, project: Option<String>) -> ClientOptions {
        let mut options = ClientOptions {
            project_id: project.or_else(|| self.effective_project()),
            ..ClientOptions::default()
        };

        if let Some(key_file) = &self.key_file {
            options = options.with_credentials(CredentialSource::KeyFile(key_file.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            options = options.with_endpoint(endpoint.clone());
        }
        if let Some(secs) = self.timeout_secs {
            options = options.with_timeout(Duration::from_secs(secs));
        }

        options.with_env_overrides()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(r#"{"project_id": "my-project", "page_size": 50}"#);
        assert_eq!(config.project_id.as_deref(), Some("my-project"));
        assert_eq!(config.effective_page_size(), 50);
        assert_eq!(config.effective_concurrency(), DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_parse_corrupt_config_gives_defaults() {
        assert_eq!(Config::parse("{not json"), Config::default());
    }

    #[test]
    fn test_client_options_prefer_explicit_project() {
        let config = Config {
            project_id: Some("config-project".to_string()),
            key_file: Some(PathBuf::from("/tmp/key.json")),
            timeout_secs: Some(30),
            ..Config::default()
        };

        let options = config.client_options(Some("cli-project".to_string()));
        assert_eq!(options.project_id.as_deref(), Some("cli-project"));
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
    }
}
