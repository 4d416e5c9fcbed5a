//! Command-line interface for the relay
//!
//! Provides argument parsing and subcommand handling for the server binary.

use clap::{Parser, Subcommand};

/// Credential-injecting CORS relay for the DeepSeek chat API
#[derive(Parser)]
#[command(name = "deepseek-relay")]
#[command(version)]
#[command(about = "Credential-injecting CORS relay for the DeepSeek chat API")]
#[command(
    long_about = "deepseek-relay accepts chat completion requests from browsers, attaches \
    the provider API key held by the server, and forwards each request to the provider \
    with a deadline. The key is read from the environment variable named in [relay] api_key_env."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# deepseek-relay configuration
#
# Every setting below is optional; the values shown are the defaults.
# The provider API key is NOT stored here. Export it in the environment
# variable named by relay.api_key_env before starting the server.

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8888

[relay]
# Full chat completions URL of the provider
upstream_url = "https://api.deepseek.com/v1/chat/completions"

# Model identifier sent with every request
model = "deepseek-chat"

# Environment variable holding the provider secret
api_key_env = "DEEPSEEK_API_KEY"

# Deadline for the whole upstream call in seconds (1-300)
timeout_seconds = 10

# Shape of successful responses:
#   - "envelope":    { "success": true, "choices": [...], "usage": {...} }
#   - "passthrough": the provider's JSON payload, unchanged
response_shape = "envelope"

# Used when a request omits max_tokens / temperature
default_max_tokens = 600
default_temperature = 0.7

# Largest accepted request body in bytes
max_body_bytes = 2097152

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["deepseek-relay"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["deepseek-relay", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["deepseek-relay", "config", "-o", "relay.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "relay.toml"
        ));
    }

    #[test]
    fn template_matches_defaults() {
        let from_template = crate::config::Config::from_str(generate_config_template())
            .expect("template should be a valid config");
        let defaults = crate::config::Config::default();

        assert_eq!(from_template.server.port, defaults.server.port);
        assert_eq!(from_template.relay.upstream_url, defaults.relay.upstream_url);
        assert_eq!(from_template.relay.model, defaults.relay.model);
        assert_eq!(from_template.relay.api_key_env, defaults.relay.api_key_env);
        assert_eq!(
            from_template.relay.timeout_seconds,
            defaults.relay.timeout_seconds
        );
        assert_eq!(
            from_template.relay.response_shape,
            defaults.relay.response_shape
        );
        assert_eq!(
            from_template.relay.default_max_tokens,
            defaults.relay.default_max_tokens
        );
        assert_eq!(
            from_template.relay.default_temperature,
            defaults.relay.default_temperature
        );
        assert_eq!(from_template.relay.max_body_bytes, defaults.relay.max_body_bytes);
    }
}
