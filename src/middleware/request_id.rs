//! Per-request correlation IDs
//!
//! A caller that already tags its request with a UUID in `x-request-id`
//! keeps that ID; otherwise a fresh v4 UUID is minted. Either way the ID
//! lands in request extensions for handlers and is echoed on the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::fmt;
use uuid::Uuid;

/// Request ID header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID carried in request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Mint a new random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Caller-supplied ID, if the header holds a valid UUID
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Attach a [`RequestId`] to the request and echo it on the response
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let supplied = RequestId::from_headers(request.headers());
    let request_id = supplied.unwrap_or_default();

    tracing::debug!(
        request_id = %request_id,
        caller_supplied = supplied.is_some(),
        method = %request.method(),
        uri = %request.uri(),
        "Incoming request"
    );

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    // A hyphenated UUID is always a valid header value
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
