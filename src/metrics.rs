//! Prometheus metrics collection for the relay
//!
//! Tracks how each invocation ended and how long the upstream call took.
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// How a relay invocation ended
///
/// Restricts the `outcome` label to a fixed set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Preflight,
    MethodNotAllowed,
    MalformedBody,
    MissingCredential,
    UpstreamRejected,
    Timeout,
    Failed,
    Success,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Preflight => "preflight",
            Outcome::MethodNotAllowed => "method_not_allowed",
            Outcome::MalformedBody => "malformed_body",
            Outcome::MissingCredential => "missing_credential",
            Outcome::UpstreamRejected => "upstream_rejected",
            Outcome::Timeout => "timeout",
            Outcome::Failed => "failed",
            Outcome::Success => "success",
        }
    }
}

/// Metrics collector for the relay
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    upstream_duration: Histogram,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 8 outcomes = 8 time series
        let requests_total = IntCounterVec::new(
            Opts::new(
                "relay_requests_total",
                "Total number of relay invocations by outcome",
            ),
            &["outcome"],
        )?;

        let upstream_duration = Histogram::with_opts(
            HistogramOpts::new(
                "relay_upstream_duration_seconds",
                "Latency of outbound provider calls in seconds, including timed-out calls",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            upstream_duration,
        })
    }

    /// Count one finished invocation
    pub fn record_outcome(&self, outcome: Outcome) {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Record the latency of one outbound call
    pub fn record_upstream_duration(&self, seconds: f64) {
        self.upstream_duration.observe(seconds);
    }

    /// Current count for an outcome
    pub fn outcome_count(&self, outcome: Outcome) -> u64 {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Number of outbound calls observed so far
    pub fn upstream_call_count(&self) -> u64 {
        self.upstream_duration.get_sample_count()
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_families.len(),
                "Prometheus text encoder failed"
            );
            e
        })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_registers_collectors() {
        let metrics = Metrics::new().expect("should create metrics");
        metrics.record_outcome(Outcome::Success);
        metrics.record_upstream_duration(0.2);

        let output = metrics.gather().expect("should gather");
        assert!(output.contains("relay_requests_total"));
        assert!(output.contains("relay_upstream_duration_seconds"));
    }

    #[test]
    fn test_outcome_counts_are_independent() {
        let metrics = Metrics::new().expect("should create metrics");
        metrics.record_outcome(Outcome::Timeout);
        metrics.record_outcome(Outcome::Timeout);
        metrics.record_outcome(Outcome::Success);

        assert_eq!(metrics.outcome_count(Outcome::Timeout), 2);
        assert_eq!(metrics.outcome_count(Outcome::Success), 1);
        assert_eq!(metrics.outcome_count(Outcome::Failed), 0);
    }

    #[test]
    fn test_outcome_labels_are_snake_case() {
        assert_eq!(Outcome::MethodNotAllowed.as_str(), "method_not_allowed");
        assert_eq!(Outcome::UpstreamRejected.as_str(), "upstream_rejected");
        assert_eq!(Outcome::MissingCredential.as_str(), "missing_credential");
    }

    #[test]
    fn test_upstream_call_count_tracks_observations() {
        let metrics = Metrics::new().expect("should create metrics");
        assert_eq!(metrics.upstream_call_count(), 0);
        metrics.record_upstream_duration(1.5);
        assert_eq!(metrics.upstream_call_count(), 1);
    }
}
