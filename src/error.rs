//! Error types for the relay
//!
//! All errors implement `IntoResponse` for Axum handlers. The rendered body
//! is always a JSON object with an `error` field; diagnostic detail goes in
//! `message`, and upstream rejections echo the provider status in `status`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("API key is not set")]
    MissingCredential,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Upstream returned HTTP {status}")]
    UpstreamRejected { status: StatusCode },

    #[error("Upstream did not respond within {timeout_seconds} seconds")]
    UpstreamTimeout { timeout_seconds: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorBody {
    fn new(error: &'static str) -> Self {
        Self {
            error,
            message: None,
            status: None,
        }
    }

    fn with_message(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: Some(message.into()),
            status: None,
        }
    }
}

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Server configuration error: API key is not set";
pub const UPSTREAM_FAILED_MESSAGE: &str = "Upstream API call failed";
pub const TIMEOUT_MESSAGE: &str = "Request timed out, please try again later";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// HTTP status and body this error renders to
    pub fn to_parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody::new(METHOD_NOT_ALLOWED_MESSAGE),
            ),
            Self::MissingCredential => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(MISSING_CREDENTIAL_MESSAGE),
            ),
            Self::UpstreamRejected { status } => (
                *status,
                ErrorBody {
                    error: UPSTREAM_FAILED_MESSAGE,
                    message: None,
                    status: Some(status.as_u16()),
                },
            ),
            Self::UpstreamTimeout { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::with_message(TIMEOUT_MESSAGE, self.to_string()),
            ),
            Self::MalformedBody(msg) | Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::with_message(INTERNAL_MESSAGE, msg.clone()),
            ),
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::with_message(INTERNAL_MESSAGE, self.to_string()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();
        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
