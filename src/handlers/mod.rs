//! HTTP request handlers for the relay API

use crate::config::Config;
use crate::credential::ApiKey;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::{cors_middleware, request_id_middleware};
use crate::upstream::UpstreamClient;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub mod health;
pub mod metrics;
pub mod relay;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers. Nothing in
/// here is mutated after construction.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    api_key: Option<Arc<ApiKey>>,
    upstream: Arc<UpstreamClient>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState from configuration and the provider secret
    ///
    /// A missing key is not an error here; requests are answered with a
    /// configuration error until the process is restarted with the key set.
    pub fn new(config: Config, api_key: Option<ApiKey>) -> AppResult<Self> {
        let upstream = UpstreamClient::new(&config.relay)?;
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            api_key: api_key.map(Arc::new),
            upstream: Arc::new(upstream),
            metrics: Arc::new(metrics),
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the provider secret, if one was configured
    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_deref()
    }

    /// Get reference to the upstream client
    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Build the full application router
///
/// `/health` and `/metrics` answer `GET` themselves; every other method on
/// them, and every request on any other path, goes to the relay.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config().relay.max_body_bytes;

    with_layers(
        Router::new()
            .route("/health", get(health::handler).fallback(relay::handler))
            .route("/metrics", get(metrics::handler).fallback(relay::handler))
            .fallback(relay::handler)
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(state),
    )
}

/// Wrap a router in the server's middleware stack
///
/// Layer order, innermost first: panic catcher, request ID, CORS, tracing.
pub fn with_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Render a caught handler panic as the generic 500 envelope
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");
    AppError::Internal(detail).into_response()
}
