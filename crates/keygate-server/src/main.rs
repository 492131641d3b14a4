//! # keygate server
//!
//! Serves the token issuance endpoint and the user-scoped routes guarded by
//! the bearer token validator.

use clap::Parser;
use keygate_api::{build_router, AppState};
use keygate_common::auth::SigningConfig;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "keygate", version, about = "Short-lived bearer token issuer and validator")]
struct Cli {
    /// Config file name, without extension (e.g. `config` reads `config.toml` if present)
    #[arg(long, env = "KEYGATE_CONFIG", default_value = "config")]
    config: String,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keygate=debug,keygate_api=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .init();

    // Load configuration
    let mut config = keygate_common::config::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let signing = Arc::new(SigningConfig::from_auth_config(&config.auth)?);
    tracing::info!(
        algorithm = ?signing.algorithm(),
        token_ttl_secs = signing.token_ttl_secs(),
        "Starting keygate v{}",
        env!("CARGO_PKG_VERSION")
    );

    let router = build_router(AppState::new(signing));
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
