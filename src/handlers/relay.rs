//! Chat completions relay handler
//!
//! Accepts `POST` with a chat completion payload on any path, injects the
//! provider credential, makes one upstream call under a deadline, and
//! answers with either the shaped upstream payload or a normalized error.
//! `OPTIONS` is answered as a CORS preflight.

use crate::config::{RelayConfig, ResponseShape};
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::metrics::Outcome;
use crate::middleware::RequestId;
use crate::middleware::cors::{preflight, with_cors};
use crate::upstream::{UpstreamRequest, truncate_for_log};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::Method,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Chat request from the caller
///
/// Fields are forwarded as the caller wrote them; their shape is left for
/// the provider to judge. Only a field that is absent falls back to its
/// configured default, so an explicit `null` is forwarded as `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "present")]
    pub messages: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub max_tokens: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub temperature: Option<Value>,
}

/// Keep a present field, `null` included, as `Some`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ChatRequest {
    /// Build the provider request body, filling in defaults
    pub fn into_upstream(self, config: &RelayConfig) -> UpstreamRequest {
        UpstreamRequest {
            model: config.model.clone(),
            messages: self.messages,
            max_tokens: self
                .max_tokens
                .unwrap_or_else(|| config.default_max_tokens.into()),
            temperature: self
                .temperature
                .unwrap_or_else(|| config.default_temperature.into()),
            stream: false,
        }
    }
}

/// Turn a successful upstream payload into the caller-facing body
///
/// The envelope shape is `{ "success": true, "choices", "usage" }`; a field
/// the upstream did not send is left out rather than set to null.
pub fn shape_response(shape: ResponseShape, payload: Value) -> Value {
    match shape {
        ResponseShape::Passthrough => payload,
        ResponseShape::Envelope => {
            let mut envelope = serde_json::Map::new();
            envelope.insert("success".to_string(), Value::Bool(true));
            for field in ["choices", "usage"] {
                if let Some(value) = payload.get(field) {
                    envelope.insert(field.to_string(), value.clone());
                }
            }
            Value::Object(envelope)
        }
    }
}

/// Metrics outcome for a failed invocation
fn outcome_for(error: &AppError) -> Outcome {
    match error {
        AppError::MethodNotAllowed => Outcome::MethodNotAllowed,
        AppError::MalformedBody(_) => Outcome::MalformedBody,
        AppError::MissingCredential => Outcome::MissingCredential,
        AppError::UpstreamRejected { .. } => Outcome::UpstreamRejected,
        AppError::UpstreamTimeout { .. } => Outcome::Timeout,
        _ => Outcome::Failed,
    }
}

/// Relay handler, mounted as the router fallback
///
/// # Responses
///
/// - `OPTIONS` → 200, empty body
/// - `POST` success → 200 with the configured response shape
/// - upstream non-2xx → upstream status, `{ "error", "status" }`
/// - missing key, unreadable or oversized body, unparseable body, timeout,
///   transport failure → 500, `{ "error", "message"? }`
/// - any other method → 405
///
/// Every response carries the CORS header set.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method == Method::OPTIONS {
        state.metrics().record_outcome(Outcome::Preflight);
        return preflight().await;
    }

    let response = match relay(&state, request_id, &method, body).await {
        Ok(response) => {
            state.metrics().record_outcome(Outcome::Success);
            response
        }
        Err(e) => {
            state.metrics().record_outcome(outcome_for(&e));
            e.into_response()
        }
    };

    with_cors(response)
}

async fn relay(
    state: &AppState,
    request_id: RequestId,
    method: &Method,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    if *method != Method::POST {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            "Rejecting request with unsupported method"
        );
        return Err(AppError::MethodNotAllowed);
    }

    let body = body.map_err(|rejection| {
        tracing::error!(
            request_id = %request_id,
            rejection_status = rejection.status().as_u16(),
            error = %rejection.body_text(),
            "Failed to read request body"
        );
        AppError::MalformedBody(rejection.body_text())
    })?;

    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(
            request_id = %request_id,
            body_length = body.len(),
            error = %e,
            "Failed to parse request body"
        );
        AppError::MalformedBody(e.to_string())
    })?;

    let Some(api_key) = state.api_key() else {
        tracing::error!(
            request_id = %request_id,
            api_key_env = %state.config().relay.api_key_env,
            "Provider API key is not configured, refusing to call upstream"
        );
        return Err(AppError::MissingCredential);
    };

    let relay_config = &state.config().relay;
    let upstream_request = request.into_upstream(relay_config);

    let reply = state
        .upstream()
        .send(api_key, &upstream_request, request_id, |elapsed| {
            state
                .metrics()
                .record_upstream_duration(elapsed.as_secs_f64())
        })
        .await?;

    if !reply.status.is_success() {
        tracing::error!(
            request_id = %request_id,
            status = reply.status.as_u16(),
            body = %truncate_for_log(&reply.body),
            elapsed_ms = reply.elapsed.as_millis() as u64,
            "Upstream rejected chat completion request"
        );
        return Err(AppError::UpstreamRejected {
            status: reply.status,
        });
    }

    let payload: Value = serde_json::from_str(&reply.body).map_err(|e| {
        tracing::error!(
            request_id = %request_id,
            status = reply.status.as_u16(),
            body = %truncate_for_log(&reply.body),
            error = %e,
            "Upstream success body is not valid JSON"
        );
        AppError::Internal(format!("Upstream returned invalid JSON: {}", e))
    })?;

    tracing::info!(
        request_id = %request_id,
        status = reply.status.as_u16(),
        elapsed_ms = reply.elapsed.as_millis() as u64,
        shape = ?relay_config.response_shape,
        "Chat completion relayed"
    );

    Ok(Json(shape_response(relay_config.response_shape, payload)).into_response())
}
