//! Configuration management for the relay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section and field has a default, so an empty file is a valid
//! configuration that relays to the public DeepSeek endpoint.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Upper bound for the upstream deadline
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Log levels accepted by `observability.log_level`
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

/// How a successful upstream payload is returned to the caller
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `{ "success": true, "choices": ..., "usage": ... }`
    #[default]
    Envelope,
    /// The upstream JSON payload, unchanged
    Passthrough,
}

/// Upstream provider and per-request defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Full chat completions URL of the provider
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Provider model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the provider secret
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Deadline for the whole upstream exchange
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub response_shape: ResponseShape,
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Largest accepted request body; bigger bodies get the malformed-body error
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout_seconds(),
            response_shape: ResponseShape::default(),
            default_max_tokens: default_max_tokens(),
            default_temperature: default_temperature(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_tokens() -> u32 {
    600
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; call it explicitly when
    /// building a `Config` by hand.
    pub fn validate(&self) -> AppResult<()> {
        let relay = &self.relay;

        if !relay.upstream_url.starts_with("http://") && !relay.upstream_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "relay.upstream_url '{}' must start with 'http://' or 'https://'",
                relay.upstream_url
            )));
        }

        if relay.model.trim().is_empty() {
            return Err(AppError::Config("relay.model cannot be empty".to_string()));
        }

        if relay.api_key_env.trim().is_empty() {
            return Err(AppError::Config("relay.api_key_env cannot be empty".to_string()));
        }

        if relay.timeout_seconds == 0 {
            return Err(AppError::Config(
                "relay.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if relay.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "relay.timeout_seconds cannot exceed {} seconds, got {}",
                MAX_TIMEOUT_SECONDS, relay.timeout_seconds
            )));
        }

        if relay.default_max_tokens == 0 {
            return Err(AppError::Config(
                "relay.default_max_tokens must be greater than 0".to_string(),
            ));
        }

        if relay.max_body_bytes == 0 {
            return Err(AppError::Config("relay.max_body_bytes must be greater than 0".to_string()));
        }

        // Standard LLM sampling range
        if !relay.default_temperature.is_finite()
            || !(0.0..=2.0).contains(&relay.default_temperature)
        {
            return Err(AppError::Config(format!(
                "relay.default_temperature must be a finite number between 0.0 and 2.0, got {}",
                relay.default_temperature
            )));
        }

        let level = self.observability.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.observability.log_level
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 9000

[relay]
upstream_url = "http://localhost:4000/v1/chat/completions"
model = "deepseek-reasoner"
api_key_env = "MY_PROVIDER_KEY"
timeout_seconds = 25
response_shape = "passthrough"
default_max_tokens = 1024
default_temperature = 1.0
max_body_bytes = 65536

[observability]
log_level = "debug"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.relay.upstream_url,
            "http://localhost:4000/v1/chat/completions"
        );
        assert_eq!(config.relay.model, "deepseek-reasoner");
        assert_eq!(config.relay.api_key_env, "MY_PROVIDER_KEY");
        assert_eq!(config.relay.timeout_seconds, 25);
        assert_eq!(config.relay.response_shape, ResponseShape::Passthrough);
        assert_eq!(config.relay.default_max_tokens, 1024);
        assert_eq!(config.relay.default_temperature, 1.0);
        assert_eq!(config.relay.max_body_bytes, 65536);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").expect("empty config should be valid");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8888);
        assert_eq!(
            config.relay.upstream_url,
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(config.relay.model, "deepseek-chat");
        assert_eq!(config.relay.api_key_env, "DEEPSEEK_API_KEY");
        assert_eq!(config.relay.timeout_seconds, 10);
        assert_eq!(config.relay.response_shape, ResponseShape::Envelope);
        assert_eq!(config.relay.default_max_tokens, 600);
        assert_eq!(config.relay.default_temperature, 0.7);
        assert_eq!(config.relay.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_unknown_response_shape_rejected() {
        let result = Config::from_str("[relay]\nresponse_shape = \"reshaped\"\n");
        assert!(matches!(result, Err(AppError::ConfigParseFailed { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::from_str("[relay]\ntimeout_seconds = 0\n");
        let err = result.expect_err("zero timeout must fail validation");
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn test_excessive_timeout_rejected() {
        let result = Config::from_str("[relay]\ntimeout_seconds = 301\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_http_upstream_rejected() {
        let result = Config::from_str("[relay]\nupstream_url = \"ftp://example.com\"\n");
        let err = result.expect_err("non-http upstream must fail validation");
        assert!(err.to_string().contains("upstream_url"));
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        assert!(Config::from_str("[relay]\ndefault_temperature = 2.5\n").is_err());
        assert!(Config::from_str("[relay]\ndefault_temperature = -0.1\n").is_err());
        assert!(Config::from_str("[relay]\ndefault_temperature = nan\n").is_err());
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(Config::from_str("[relay]\nmodel = \"  \"\n").is_err());
    }

    #[test]
    fn test_empty_api_key_env_rejected() {
        assert!(Config::from_str("[relay]\napi_key_env = \"\"\n").is_err());
    }

    #[test]
    fn test_zero_default_max_tokens_rejected() {
        assert!(Config::from_str("[relay]\ndefault_max_tokens = 0\n").is_err());
    }

    #[test]
    fn test_zero_max_body_bytes_rejected() {
        let err = Config::from_str("[relay]\nmax_body_bytes = 0\n").expect_err("zero limit");
        assert!(err.to_string().contains("max_body_bytes"));
    }

    #[test]
    fn test_log_level_is_validated() {
        assert!(Config::from_str("[observability]\nlog_level = \"WARN\"\n").is_ok());
        let err = Config::from_str("[observability]\nlog_level = \"loud\"\n")
            .expect_err("unknown level");
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn test_from_file_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
        file.write_all(TEST_CONFIG.as_bytes())
            .expect("should write config");

        let config = Config::from_file(file.path()).expect("should load config file");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_from_file_missing_file_reports_path() {
        let err = Config::from_file("/nonexistent/relay.toml").expect_err("missing file");
        assert!(matches!(err, AppError::ConfigFileRead { .. }));
        assert!(err.to_string().contains("/nonexistent/relay.toml"));
    }

    #[test]
    fn test_from_file_validation_failure_has_context() {
        let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
        file.write_all(b"[relay]\ntimeout_seconds = 0\n")
            .expect("should write config");

        let err = Config::from_file(file.path()).expect_err("invalid config");
        assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
    }
}
