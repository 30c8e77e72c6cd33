//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging, wires the upstream client into
//! the tool registry and starts the configured transport.

use anyhow::Result;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use commerce_mcp_server::core::{Config, McpServer, TransportService};
use commerce_mcp_server::domains::tools::ToolContext;
use commerce_mcp_server::domains::upstream::{AuthContext, HttpUpstream};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment (and .env)
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    serve(config).await?;

    info!("Server shutting down");

    Ok(())
}

/// Build the upstream client and run the configured transport until it stops.
async fn serve(config: Config) -> commerce_mcp_server::Result<()> {
    // Upstream client shared by every tool call
    let auth = AuthContext::from_credentials(&config.credentials);
    let upstream = HttpUpstream::new(config.upstream.clone(), auth)?;
    let context = ToolContext::new(Arc::new(upstream));

    // Create the MCP server
    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config, context);

    info!("Server initialized");

    transport.run(server).await?;
    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs are written to stderr so the STDIO transport keeps stdout clean.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
