//! HTTP server entry point.
//!
//! Loads `.env`, reads configuration from the environment, and serves the
//! chat API on port 3000 unless `PORT` says otherwise.

use std::sync::Arc;

use anyhow::Result;
use thali_config::ServerConfig;
use thali_server::{router, ServerState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        "Model: {} ({:?}), static dir: {}",
        config.llm.model,
        config.llm.provider(),
        config.static_dir.display()
    );

    let state = Arc::new(ServerState::from_config(&config)?);
    let app = router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
