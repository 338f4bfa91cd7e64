use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelrank::{
    config::Config,
    routes::{create_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelrank=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let weights = config.weights().context("Invalid SCORING_WEIGHTS")?;
    if (weights.sum() - 1.0).abs() > 0.05 {
        tracing::warn!(sum = weights.sum(), "Scoring weights do not sum to 1, final scores will be clamped");
    }

    let state = Arc::new(AppState::from_config(&config).context("Failed to build application state")?);

    // The first request embeds the catalog lazily if this fails
    if let Err(e) = state.recommender.similarity().init().await {
        tracing::warn!(error = %e, "Catalog embedding failed at startup");
    }

    let app = create_router(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.recommender.similarity().shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
