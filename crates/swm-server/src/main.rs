mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use server::SwaggerServer;
use swm_core::QueryService;

#[derive(Parser)]
#[command(name = "swagger-mcp")]
#[command(about = "MCP server for querying OpenAPI/Swagger documents")]
#[command(version)]
struct Cli {
    /// Default document source (URL or file path), loaded lazily on first
    /// query if no explicit load_swagger call has happened.
    #[arg(long, env = "SWAGGER_URI")]
    source: Option<String>,

    /// Timeout for fetching remote documents, in seconds.
    #[arg(long, env = "SWAGGER_TIMEOUT_SECS", default_value = "30")]
    timeout: u64,

    /// Eagerly load the default source at startup instead of on first query.
    #[arg(long)]
    preload: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP transport; logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let service = Arc::new(QueryService::new(
        cli.source.clone(),
        Duration::from_secs(cli.timeout),
    ));

    if cli.preload {
        if let Some(source) = cli.source.as_deref() {
            match service.load_swagger(source).await {
                Ok(summary) => info!(
                    "preloaded {} ({} operations, {} schemas)",
                    summary.title, summary.operation_count, summary.schema_count
                ),
                // Startup survives a bad default; queries retry lazily.
                Err(e) => warn!("failed to preload {source}: {e}"),
            }
        } else {
            warn!("--preload given but no source configured");
        }
    }

    let transport = rmcp::transport::io::stdio();
    let running = rmcp::serve_server(SwaggerServer::new(service), transport).await?;
    running.waiting().await?;

    Ok(())
}
