//! GCP Authentication
//!
//! Handles authentication using Application Default Credentials (ADC) or a
//! service account key file, and discovery of the default project from the
//! environment and gcloud configuration.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Scopes requested for Pub/Sub access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/pubsub"];

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Where credentials come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// Application Default Credentials (gcloud, metadata server, GOOGLE_APPLICATION_CREDENTIALS)
    #[default]
    ApplicationDefault,
    /// Service account key file
    KeyFile(PathBuf),
    /// No authentication, for the local Pub/Sub emulator
    None,
}

/// GCP credentials holder with token caching
#[derive(Clone)]
pub struct GcpCredentials {
    provider: Option<Arc<dyn TokenProvider>>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Cache `token` until `TOKEN_EXPIRY_BUFFER_SECS` before its real expiry
    fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            expires_at: expires_at - Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS),
        }
    }

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl GcpCredentials {
    /// Create credentials for the given source
    pub async fn new(source: &CredentialSource) -> Result<Self> {
        let provider: Option<Arc<dyn TokenProvider>> = match source {
            CredentialSource::ApplicationDefault => Some(gcp_auth::provider().await?),
            CredentialSource::KeyFile(path) => Some(Self::from_key_file(path)?),
            CredentialSource::None => None,
        };

        Ok(Self {
            provider,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Credentials that never attach a token
    pub fn anonymous() -> Self {
        Self {
            provider: None,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    fn from_key_file(path: &Path) -> Result<Arc<dyn TokenProvider>> {
        tracing::debug!("Loading service account key from {:?}", path);
        let account = CustomServiceAccount::from_file(path)?;
        Ok(Arc::new(account))
    }

    /// Whether requests should carry a bearer token
    pub fn is_anonymous(&self) -> bool {
        self.provider.is_none()
    }

    /// Get an access token for API calls, `None` for anonymous credentials
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<Option<String>> {
        let Some(provider) = self.provider.as_ref() else {
            return Ok(None);
        };

        if let Some(token) = self.cached_token(Utc::now()).await {
            return Ok(Some(token));
        }

        let token = provider.token(DEFAULT_SCOPES).await?;
        let cached = CachedToken::new(token.as_str().to_string(), token.expires_at());

        tracing::debug!("New token cached until {}", cached.expires_at);

        let token_str = cached.token.clone();
        *self.token_cache.write().await = Some(cached);

        Ok(Some(token_str))
    }

    /// Cached token still valid at `now`
    async fn cached_token(&self, now: DateTime<Utc>) -> Option<String> {
        let cache = self.token_cache.read().await;
        let cached = cache.as_ref()?;
        if cached.is_valid_at(now) {
            Some(cached.token.clone())
        } else {
            tracing::debug!("Cached token expired, fetching new token");
            None
        }
    }
}

/// Get the gcloud configuration directory
pub fn get_gcloud_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // Default to ~/.config/gcloud on Linux/macOS
    dirs::config_dir().map(|p| p.join("gcloud"))
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    match project.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {},
        _ => return false,
    }

    if project.ends_with('-') {
        return false;
    }

    project
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Find `project = ...` inside the `[core]` section of a gcloud properties file
fn parse_core_project(content: &str) -> Option<String> {
    let mut in_core_section = false;
    for line in content.lines() {
        let line = line.trim();
        // Security: Skip comments
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line == "[core]" {
            in_core_section = true;
        } else if line.starts_with('[') {
            in_core_section = false;
        } else if in_core_section && line.starts_with("project") && line.contains('=') {
            if let Some(value) = line.split('=').nth(1) {
                let project = value.trim().to_string();
                if validate_project_id(&project) {
                    return Some(project);
                }
            }
        }
    }
    None
}

/// Read the default project from the environment or gcloud configuration
/// Security: Validates project ID format before returning
pub fn get_default_project() -> Option<String> {
    for var in ["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }

    let config_dir = get_gcloud_config_dir()?;

    if let Ok(content) = std::fs::read_to_string(config_dir.join("properties")) {
        if let Some(project) = parse_core_project(&content) {
            return Some(project);
        }
    }

    let active_config = std::fs::read_to_string(config_dir.join("active_config")).ok()?;
    let config_name = active_config.trim();

    // Security: Validate config name to prevent path traversal
    if !config_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        tracing::warn!("Invalid characters in active_config name");
        return None;
    }

    let config_path = config_dir
        .join("configurations")
        .join(format!("config_{}", config_name));

    let content = std::fs::read_to_string(config_path).ok()?;
    parse_core_project(&content)
}
