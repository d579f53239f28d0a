// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moneybook_server::{
    api::router,
    auth::CredentialHasher,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    interactor::{ImageStorage, Interactor},
    state::AppState,
    storage::{FsBlobStore, RecordDatabase},
};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolves on Ctrl-C or SIGTERM and cancels `shutdown`.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
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
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(LogFormat::from_env());

    let config = AppConfig::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    let paths = config.storage_paths();
    let database = Arc::new(RecordDatabase::open(&paths.database_file())?);

    let images = if config.blob_storage_enabled {
        let blobs = FsBlobStore::open(&config.blob_dir)?;
        tracing::info!(root = %config.blob_dir.display(), "Image payloads offloaded to blob store");
        ImageStorage::Offloaded(Arc::new(blobs))
    } else {
        tracing::info!("Image payloads kept inline");
        ImageStorage::Inline
    };

    let hasher = CredentialHasher::new(config.credential_key.as_bytes())?;
    let interactor = Interactor::new(database, hasher, config.session_ttl, images)
        .with_span(tracing::info_span!("interactor"));
    let app = router(AppState::new(interactor));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Moneybook server listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
