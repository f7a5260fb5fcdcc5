use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use smart_grep::api;
use smart_grep::config::Config;
use smart_grep::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    for m in &config.modalities {
        tracing::info!(
            "Embedding modality {}: {} ({})",
            m.name,
            m.embedding.provider,
            m.embedding.base_url
        );
    }

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/", get(health))
        .route("/api/ingest", post(api::repos::ingest))
        .route("/api/reindex", post(api::repos::reindex))
        .route("/api/tree", get(api::repos::file_tree))
        .route("/api/search", post(api::search::search))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "smart-grep is running"
}
