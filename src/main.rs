//! deepseek-relay HTTP server
//!
//! Starts an Axum web server that relays chat completion requests to the
//! configured provider.

use clap::Parser;
use deepseek_relay::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    credential::ApiKey,
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability);

    let api_key = ApiKey::from_env(&config.relay.api_key_env);
    match &api_key {
        Some(key) => tracing::info!(
            api_key_env = %config.relay.api_key_env,
            api_key = %key,
            "Provider API key loaded"
        ),
        None => tracing::warn!(
            api_key_env = %config.relay.api_key_env,
            "Provider API key is not set; relay requests will fail with a configuration error"
        ),
    }

    tracing::info!(
        upstream_url = %config.relay.upstream_url,
        model = %config.relay.model,
        timeout_seconds = config.relay.timeout_seconds,
        response_shape = ?config.relay.response_shape,
        "Relay configured"
    );

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    let state = AppState::new(config, api_key)?;
    let app = handlers::app(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
