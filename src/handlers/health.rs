//! Health check endpoint
//!
//! Provides a simple liveness probe for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Whether a provider key was found at startup: "configured" or "missing"
    pub credential: &'static str,
}

/// Health check handler
///
/// Always returns 200 OK. A missing credential is reported but does not
/// make the service unhealthy; relay requests answer it with a 500.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let credential = if state.api_key().is_some() {
        "configured"
    } else {
        "missing"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            credential,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::credential::ApiKey;

    #[tokio::test]
    async fn test_health_handler_reports_configured_key() {
        let state = AppState::new(Config::default(), ApiKey::new("sk-test")).unwrap();
        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert_eq!(body.credential, "configured");
    }

    #[tokio::test]
    async fn test_health_handler_reports_missing_key() {
        let state = AppState::new(Config::default(), None).unwrap();
        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.credential, "missing");
    }
}
