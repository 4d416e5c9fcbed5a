//! Outbound provider call
//!
//! Builds the chat completions request, sends it with the bearer credential,
//! and races the whole exchange (send plus body read) against a deadline.
//! On expiry the in-flight future is dropped, which aborts the connection.

use crate::config::RelayConfig;
use crate::credential::ApiKey;
use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use axum::http::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Longest slice of an upstream error body kept in logs
const MAX_LOGGED_ERROR_BODY: usize = 500;

/// Body sent to the provider
///
/// Generation parameters stay JSON values so whatever the caller sent
/// (including `null` or a string) reaches the provider untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<serde_json::Value>,
    pub max_tokens: serde_json::Value,
    pub temperature: serde_json::Value,
    pub stream: bool,
}

/// Raw outcome of an outbound call that produced an HTTP response
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: String,
    pub elapsed: Duration,
}

/// HTTP client for the provider's chat completions endpoint
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl UpstreamClient {
    /// Create a client from relay configuration
    pub fn new(config: &RelayConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.upstream_url.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    /// Target URL of the provider
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deadline applied to every call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one chat completion request
    ///
    /// Returns the upstream status and body text for any HTTP response.
    /// Transport failures become `AppError::Internal` and an expired
    /// deadline becomes `AppError::UpstreamTimeout`. The elapsed time is
    /// reported through `on_elapsed` on every path, including failures.
    pub async fn send(
        &self,
        api_key: &ApiKey,
        request: &UpstreamRequest,
        request_id: RequestId,
        on_elapsed: impl FnOnce(Duration),
    ) -> AppResult<UpstreamReply> {
        tracing::debug!(
            request_id = %request_id,
            url = %self.url,
            model = %request.model,
            max_tokens = %request.max_tokens,
            temperature = %request.temperature,
            timeout_seconds = self.timeout.as_secs(),
            api_key = %api_key,
            "Sending upstream chat completion request"
        );

        let start = Instant::now();
        let exchange = async {
            let response = self
                .http
                .post(&self.url)
                .header(CONTENT_TYPE, "application/json")
                .header(AUTHORIZATION, api_key.bearer())
                .json(request)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<(StatusCode, String), reqwest::Error>((status, body))
        };

        let result = tokio::time::timeout(self.timeout, exchange).await;
        let elapsed = start.elapsed();
        on_elapsed(elapsed);

        match result {
            Ok(Ok((status, body))) => Ok(UpstreamReply {
                status,
                body,
                elapsed,
            }),
            Ok(Err(e)) => {
                tracing::error!(
                    request_id = %request_id,
                    url = %self.url,
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Upstream request failed"
                );
                Err(AppError::Internal(format!("Upstream request failed: {}", e)))
            }
            Err(_elapsed) => {
                tracing::error!(
                    request_id = %request_id,
                    url = %self.url,
                    timeout_seconds = self.timeout.as_secs(),
                    "Upstream request timed out, aborting"
                );
                Err(AppError::UpstreamTimeout {
                    timeout_seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Truncate an upstream body for diagnostic logging
pub fn truncate_for_log(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_ERROR_BODY {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(MAX_LOGGED_ERROR_BODY).collect();
        format!("{}...", truncated)
    }
}
