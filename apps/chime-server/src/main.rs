//! chime-server: webhook listener and command registration for the chime
//! interaction engine.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chime_core::RestClient;
use chime_server::cli::{Cli, Commands};
use chime_server::config::{self, ServerConfig};
use chime_server::{http, register, state};
use clap::Parser;
use tracing::{info, warn};

/// How long shutdown waits for background continuations.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chime_server=info".parse()?)
                .add_directive("chime_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path().context("Failed to determine config path")?,
    };
    let server_config = ServerConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    info!("Configuration loaded successfully");

    let rest = RestClient::new();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&server_config, rest).await,
        Commands::Register { guild } => {
            let count = register::register(&server_config, &rest, guild.as_deref())
                .await
                .context("Failed to register commands")?;
            info!(count, "Registration complete");
            Ok(())
        }
    }
}

async fn serve(server_config: &ServerConfig, rest: RestClient) -> anyhow::Result<()> {
    let app_state = Arc::new(
        state::AppState::from_config(server_config, rest)
            .context("Failed to build application state")?,
    );

    // Setup graceful shutdown on SIGINT/SIGTERM
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("Failed to register SIGTERM handler")?;

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT, shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            info!("Received SIGINT, shutting down...");
        }

        let _ = shutdown_tx.send(true);
    });

    let addr = server_config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, path = http::INTERACTIONS_PATH, "Listening for interactions");

    axum::serve(listener, http::router(Arc::clone(&app_state)))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
        })
        .await
        .context("HTTP server failed")?;

    if !app_state.drain(DRAIN_TIMEOUT).await {
        warn!(
            in_flight = app_state.dispatcher().broker().in_flight(),
            "Shutdown timed out with continuations still running"
        );
    }

    info!("Server shut down cleanly");
    Ok(())
}
