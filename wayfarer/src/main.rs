#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::path::Path;

use args::Args;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use wayfarer_cache::CacheContext;
use wayfarer_config::Config;
use wayfarer_server::Server;
use wayfarer_server::trips::{TRIPS_CHANNEL, TripEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = load_config(&args)?;

    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }
    if let Some(environment) = args.environment {
        config.server.environment = environment;
    }

    // Initialize telemetry
    wayfarer_telemetry::init(&config.telemetry)?;

    tracing::info!(environment = %config.server.environment, "starting wayfarer");

    // Connect cache and pub/sub before accepting traffic
    let cache = CacheContext::connect(&config.cache).await?;

    cache
        .subscribe(TRIPS_CHANNEL, |event: TripEvent| {
            tracing::debug!(?event, "trip event");
        })
        .await;

    // Build server
    let server = Server::new(config, cache.clone())?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    // Run server
    let result = server.serve(shutdown).await;

    cache.close();

    result?;
    tracing::info!("wayfarer stopped");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    match args.config {
        Some(ref path) => Config::load(path),
        None if Path::new(args::DEFAULT_CONFIG).exists() => Config::load(Path::new(args::DEFAULT_CONFIG)),
        None => Ok(Config::default()),
    }
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
