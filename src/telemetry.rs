//! Log output setup
//!
//! Logs go to stderr so stdout stays clean for the `config` subcommand's
//! template output. `RUST_LOG` wins over `observability.log_level`.

use crate::config::ObservabilityConfig;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install the global subscriber; later calls are ignored
pub fn init(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(build_filter(&config.log_level))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    });
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(level)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Relay logs at `level`; HTTP request spans only at debug and below
fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    let http_level = match level.as_str() {
        "trace" | "debug" => level.as_str(),
        _ => "warn",
    };
    format!("deepseek_relay={},tower_http={}", level, http_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_target_crate() {
        assert_eq!(default_directives("info"), "deepseek_relay=info,tower_http=warn");
    }

    #[test]
    fn test_verbose_levels_enable_request_spans() {
        assert_eq!(default_directives("DEBUG"), "deepseek_relay=debug,tower_http=debug");
        assert_eq!(default_directives("trace"), "deepseek_relay=trace,tower_http=trace");
    }
}
