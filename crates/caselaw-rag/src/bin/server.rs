//! Case-law RAG server binary
//!
//! Run with: cargo run -p caselaw-rag --bin caselaw-rag-server -- --config caselaw-rag.toml

use anyhow::Context;
use caselaw_rag::{config::RagConfig, server::RagServer};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "caselaw-rag-server",
    version,
    about = "Case-law question answering with cited sources"
)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caselaw_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!(
        "  - Embedding model: {} ({} dims)",
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!(
        "  - Vector index: {} ({})",
        config.vector_index.index_name,
        config.vector_index.region
    );
    tracing::info!(
        "  - Candidates: {}, rerank top_n: {}",
        config.retrieval.top_k_candidates,
        config.reranker.top_n
    );
    tracing::info!("  - Reranker model: {}", config.reranker.model);
    tracing::info!(
        "  - Max tokens: {}, max citations: {}",
        config.generation.max_tokens,
        config.response.max_citations
    );
    for (rank, provider) in config.generation.ordered_providers().iter().enumerate() {
        tracing::info!(
            "  - Provider {}: {}/{}",
            rank + 1,
            provider.provider.as_str(),
            provider.model_name
        );
    }

    let server = RagServer::new(config).context("initializing providers")?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/query - Ask a legal question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
