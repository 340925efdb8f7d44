//! X402 Facilitator Server
//!
//! Verifies and settles x402 payments for one scheme on one network.
//!
//! ## Endpoints
//!
//! - `POST /verify` - Verify a payment against requirements
//! - `POST /settle` - Settle a payment on-chain
//! - `GET /supported` - Supported (scheme, network) pairs
//! - `GET /health` - Health check
//!
//! ## Environment
//!
//! Values are read from the process environment and an optional `.env` file. See
//! [`x402_facilitator::config`] for the full list; `X402_PRIVATE_KEY` is required.
//! `RUST_LOG` controls log verbosity (default `info`).

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use x402_facilitator::{
    config::FacilitatorSettings, facilitator::build_facilitator, server::create_router,
    types::ChainRegistry,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = FacilitatorSettings::from_env()?;
    tracing::debug!(?settings, "loaded settings");

    let registry = Arc::new(ChainRegistry::builtin());
    let facilitator = build_facilitator(&settings, registry).await?;
    for kind in &facilitator.supported().kinds {
        tracing::info!(scheme = %kind.scheme, network = %kind.network, "serving payment kind");
    }

    let app = create_router(facilitator, settings.request_timeout);

    let listener = tokio::net::TcpListener::bind(settings.bind_address).await?;
    tracing::info!(address = %settings.bind_address, "x402 facilitator listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("x402 facilitator stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received, draining connections");
    shutdown.cancel();
}
