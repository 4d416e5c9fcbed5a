//! CORS headers for browser callers
//!
//! Every response leaving the server carries the same fixed header set.
//! The middleware sits outside the panic catcher so even a caught panic
//! is decorated.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
];

/// Insert the CORS header set, replacing any existing values
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Attach CORS headers to a finished response
pub fn with_cors(mut response: Response) -> Response {
    apply_cors_headers(response.headers_mut());
    response
}

/// Preflight acknowledgement: 200 with an empty body
pub async fn preflight() -> Response {
    with_cors(StatusCode::OK.into_response())
}

/// Middleware that decorates every response with the CORS header set
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    with_cors(next.run(request).await)
}
