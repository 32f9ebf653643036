//! Scoped RAG server binary
//!
//! Run with: cargo run -p scoped-rag --bin scoped-rag-server
//! Set SCOPED_RAG_CONFIG to a TOML file to override the defaults.

use scoped_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the configuration file
const CONFIG_ENV: &str = "SCOPED_RAG_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scoped_rag=info,audit=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            tracing::info!("Loading configuration from {}", path);
            RagConfig::from_file(&path)?
        }
        Err(_) => {
            tracing::info!("{} not set, using default configuration", CONFIG_ENV);
            RagConfig::default()
        }
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Data directory: {}", config.ingestion.data_dir.display());
    tracing::info!("  - Embeddings: {:?} ({} dims)", config.embeddings.provider, config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Retrieval: top {} at >= {}", config.retrieval.top_k, config.retrieval.score_threshold);
    tracing::info!("  - Roles: {}", config.access.roles.len());

    let server = RagServer::new(config)?;

    match server.state().engine().oracle().health_check().await {
        Ok(true) => tracing::info!("Generation service is reachable"),
        _ => tracing::warn!("Generation service not reachable; answers will be degraded until it is"),
    }

    // Serve even if the initial build fails; /ready reports the state and
    // /api/admin/refresh can retry.
    match server.state().engine().refresh().await {
        Ok(summary) => tracing::info!(
            "Initial build: {} chunks across {} departments",
            summary.ingest.total_chunks(),
            summary.indexes.department_chunks.len()
        ),
        Err(e) => tracing::error!("Initial build failed: {}", e),
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
