//! Error types
//!
//! Remote failures are classified into an [`ErrorKind`] by the REST adapter so
//! callers (the provisioner in particular) can match on a stable value instead
//! of inspecting status codes or message text.

use std::fmt;
use thiserror::Error;

/// Result type for oakpubsub operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Canonical failure classification reported by the Pub/Sub service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    PermissionDenied,
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
    ResourceExhausted,
    Aborted,
    DeadlineExceeded,
    Unavailable,
    Internal,
    Other,
}

impl ErrorKind {
    /// Classify from the `error.status` field of a Google API error body.
    pub fn from_status_name(status: &str) -> Option<Self> {
        let kind = match status {
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "NOT_FOUND" => Self::NotFound,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "UNAUTHENTICATED" => Self::Unauthenticated,
            "INVALID_ARGUMENT" | "OUT_OF_RANGE" => Self::InvalidArgument,
            "FAILED_PRECONDITION" => Self::FailedPrecondition,
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted,
            "ABORTED" => Self::Aborted,
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded,
            "UNAVAILABLE" => Self::Unavailable,
            "INTERNAL" | "DATA_LOSS" => Self::Internal,
            "UNKNOWN" | "CANCELLED" | "UNIMPLEMENTED" => Self::Other,
            _ => return None,
        };
        Some(kind)
    }

    /// Classify from the HTTP status alone, used when the body carries no status name.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidArgument,
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::AlreadyExists,
            412 => Self::FailedPrecondition,
            429 => Self::ResourceExhausted,
            499 | 501 => Self::Other,
            503 => Self::Unavailable,
            504 => Self::DeadlineExceeded,
            500..=599 => Self::Internal,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already exists",
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument => "invalid argument",
            Self::FailedPrecondition => "failed precondition",
            Self::ResourceExhausted => "resource exhausted",
            Self::Aborted => "aborted",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal error",
            Self::Other => "request failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for oakpubsub.
#[derive(Error, Debug)]
pub enum Error {
    /// Client configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An argument was rejected before any request was issued.
    #[error("Invalid argument: {0}")]
    Usage(String),

    /// The service answered with a non-success status.
    #[error("API request failed ({status}, {kind}): {message}")]
    Api {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Auth(#[from] gcp_auth::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message payload encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    /// A success response was missing a required field.
    #[error("Malformed response: {0}")]
    Response(String),
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Classification of a remote failure; `None` for local errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True when the service reported the resource already exists.
    pub fn is_already_exists(&self) -> bool {
        self.kind() == Some(ErrorKind::AlreadyExists)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    /// Short message safe to show to a user.
    /// Security: avoids echoing raw API error bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { kind, .. } => match kind {
                ErrorKind::PermissionDenied => {
                    "Permission denied. Check your Pub/Sub IAM permissions.".to_string()
                },
                ErrorKind::Unauthenticated => {
                    "Authentication failed. Run 'gcloud auth application-default login'."
                        .to_string()
                },
                ErrorKind::NotFound => "Resource not found.".to_string(),
                ErrorKind::AlreadyExists => "Resource already exists.".to_string(),
                ErrorKind::ResourceExhausted => {
                    "Rate limit or quota exceeded. Please try again later.".to_string()
                },
                ErrorKind::InvalidArgument => {
                    "Invalid request. Check your parameters.".to_string()
                },
                ErrorKind::Unavailable | ErrorKind::Internal | ErrorKind::DeadlineExceeded => {
                    "Pub/Sub service temporarily unavailable. Please try again.".to_string()
                },
                _ => "Request failed. Check your network connection and try again.".to_string(),
            },
            Self::Auth(_) => {
                "Authentication failed. Run 'gcloud auth application-default login'.".to_string()
            },
            Self::Http(_) => {
                "Request failed. Check your network connection and try again.".to_string()
            },
            other => {
                let text = other.to_string();
                let mut chars = text.chars().filter(|c| c.is_ascii_graphic() || *c == ' ');
                let sanitized = chars.by_ref().take(80).collect::<String>();
                if chars.next().is_some() {
                    format!("{}...", sanitized)
                } else {
                    sanitized
                }
            },
        }
    }
}
