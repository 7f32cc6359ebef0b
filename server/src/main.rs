//! # concierged
//!
//! HTTP chat surface for Concierge. Connects to the configured tool server,
//! discovers its tools once, and serves `POST /chat` queries through the
//! orchestrator until shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use concierge_core::llm::OpenAiClient;
use concierge_core::{McpSession, Orchestrator, ToolSession};

mod config;
mod handlers;
mod routes;

use config::{ConfigLoader, ServerSettings};

/// concierged - tool-augmented chat over HTTP
#[derive(Parser)]
#[command(name = "concierged")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tool-augmented chat orchestrator over HTTP")]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override for the completion backend
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Listen address override (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    concierge_core::init_tracing_with_debug(cli.verbose);

    let settings = ConfigLoader::new()
        .with_config_override(cli.config)
        .with_api_key_override(cli.api_key)
        .with_base_url_override(cli.base_url)
        .with_model_override(cli.model)
        .with_listen_addr_override(cli.listen)
        .load()
        .context("failed to load configuration")?;

    let session = Arc::new(McpSession::new(settings.mcp_server.clone()));
    session
        .connect()
        .await
        .context("failed to connect to tool server")?;

    // The session must be released on every exit path from here on
    let result = serve(settings, session.clone()).await;
    if let Err(e) = session.close().await {
        tracing::warn!("failed to close tool session: {}", e);
    }
    result
}

async fn serve(settings: ServerSettings, session: Arc<McpSession>) -> Result<()> {
    let llm = Arc::new(OpenAiClient::new(&settings.llm).context("failed to build LLM client")?);

    let orchestrator = Arc::new(
        Orchestrator::discover(session.clone(), llm, settings.orchestrator)
            .await
            .context("failed to discover tools")?,
    );

    for spec in orchestrator.catalog().specs() {
        tracing::info!(name = %spec.name, "tool available");
    }

    let app = routes::create_router(orchestrator, session);

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen_addr))?;
    tracing::info!(addr = %settings.listen_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {}", e);
    }
}
