//! HTTP utilities for GCP REST API calls

use crate::error::{Error, ErrorKind, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Build a typed error from a non-success response.
///
/// Google APIs return `{"error": {"code": 409, "message": "...", "status": "ALREADY_EXISTS"}}`.
/// The `status` name is authoritative; the HTTP status is the fallback.
pub fn api_error(status: u16, body: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let kind = error
        .and_then(|e| e.get("status"))
        .and_then(|v| v.as_str())
        .and_then(ErrorKind::from_status_name)
        .unwrap_or_else(|| ErrorKind::from_http_status(status));

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| sanitize_for_log(body));

    Error::Api {
        kind,
        status,
        message,
    }
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client; `timeout` applies to every request
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: Option<&str>) -> Result<Value> {
        self.send(Method::GET, url, token, None).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.send(Method::POST, url, token, body).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(&self, url: &str, token: Option<&str>, body: Option<&Value>) -> Result<Value> {
        self.send(Method::PUT, url, token, body).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str, token: Option<&str>) -> Result<Value> {
        self.send(Method::DELETE, url, token, None).await
    }

    fn request(&self, method: Method, url: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.request(method, url, token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(api_error(status.as_u16(), &response_body));
        }

        // Delete and acknowledge return an empty object or nothing at all
        if response_body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response_body)?)
    }
}
