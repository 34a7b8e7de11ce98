//! GCP Client
//!
//! Main client for the Pub/Sub REST API, combining authentication
//! and HTTP functionality.

use super::auth::{CredentialSource, GcpCredentials};
use super::http::GcpHttpClient;
use crate::error::{Error, Result};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Production Pub/Sub REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com/v1/";

/// Environment variable pointing at a local Pub/Sub emulator (`host:port`)
pub const EMULATOR_HOST_ENV: &str = "PUBSUB_EMULATOR_HOST";

const USER_AGENT: &str = concat!("oakpubsub/", env!("CARGO_PKG_VERSION"));

/// Options used to construct a [`GcpClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Project that owns every topic and subscription the client touches (required)
    pub project_id: Option<String>,
    pub credentials: CredentialSource,
    /// Base URL of the Pub/Sub v1 REST API
    pub endpoint: String,
    /// Per-request timeout; `None` leaves requests unbounded
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            project_id: None,
            credentials: CredentialSource::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Point at a local emulator; the emulator does not authenticate
    pub fn with_emulator(self, host: &str) -> Self {
        self.with_endpoint(format!("http://{}/v1/", host))
            .with_credentials(CredentialSource::None)
    }

    /// Apply `PUBSUB_EMULATOR_HOST` if it is set
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(EMULATOR_HOST_ENV) {
            Ok(host) if !host.trim().is_empty() => {
                tracing::info!("Using Pub/Sub emulator at {}", host);
                self.with_emulator(host.trim())
            },
            _ => self,
        }
    }

    /// Check the options without touching the network
    pub fn validate(&self) -> Result<(String, Url)> {
        let project_id = self
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Config("a google cloud project id is required".to_string()))?;

        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", self.endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "endpoint '{}' is not a base URL",
                self.endpoint
            )));
        }

        Ok((project_id.to_string(), endpoint))
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub project_id: String,
    endpoint: Url,
}

impl GcpClient {
    /// Create a new client. Fails with [`Error::Config`] before any network
    /// activity when the project id is missing.
    pub async fn new(options: ClientOptions) -> Result<Self> {
        let (project_id, endpoint) = options.validate()?;
        let http = GcpHttpClient::new(&options.user_agent, options.timeout)?;
        let credentials = GcpCredentials::new(&options.credentials).await?;

        tracing::debug!("Pub/Sub client for project {} at {}", project_id, endpoint);

        Ok(Self {
            credentials,
            http,
            project_id,
            endpoint,
        })
    }

    /// Build a client from already-initialized credentials
    pub fn with_credentials(options: ClientOptions, credentials: GcpCredentials) -> Result<Self> {
        let (project_id, endpoint) = options.validate()?;
        let http = GcpHttpClient::new(&options.user_agent, options.timeout)?;

        Ok(Self {
            credentials,
            http,
            project_id,
            endpoint,
        })
    }

    async fn token(&self) -> Result<Option<String>> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.token().await?;
        self.http.get(url, token.as_deref()).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.token().await?;
        self.http.post(url, token.as_deref(), body).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.token().await?;
        self.http.put(url, token.as_deref(), body).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str) -> Result<Value> {
        let token = self.token().await?;
        self.http.delete(url, token.as_deref()).await
    }

    // =========================================================================
    // Pub/Sub API helpers
    // =========================================================================

    /// Build Pub/Sub API URL for a path relative to the endpoint,
    /// e.g. `projects/p/topics/t:publish`
    pub fn pubsub_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }

    /// Build URL for a project-level collection (`topics`, `subscriptions`)
    pub fn project_url(&self, collection: &str) -> String {
        self.pubsub_url(&format!("projects/{}/{}", self.project_id, collection))
    }
}
