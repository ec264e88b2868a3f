//! todoitem MCP Server
//!
//! Usage:
//!   todoitem-mcp [--config <path>] [--api-base <url>]
//!
//! The server communicates over stdio using JSON-RPC 2.0.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use todoitem_core::{ApiClient, Config};
use todoitem_mcp::{McpServer, ToolHandler};

#[derive(Parser)]
#[command(name = "todoitem-mcp")]
#[command(about = "MCP server for managing to-do items by description")]
#[command(version)]
#[command(after_help = "\
The backend address is taken from, in order: --api-base, the
TODOITEM_API_BASE environment variable, api_base in the config file,
and finally http://localhost:7027/api.

EXAMPLES:
    todoitem-mcp
    todoitem-mcp --api-base http://192.168.1.20:7027/api
    RUST_LOG=debug todoitem-mcp --config ./todoitem.toml")]
struct Cli {
    /// Config file (default: ~/.config/todoitem/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the to-do REST API
    #[arg(long)]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_env();

    let config = match cli.api_base {
        Some(base) => config.with_api_base(base),
        None => config,
    }
    .validate()?;

    let client = ApiClient::new(&config).context("Failed to build HTTP client")?;
    tracing::info!("Starting todoitem MCP server against {}", client.base());

    let mut server = McpServer::new(ToolHandler::new(client));
    server.run().await?;

    Ok(())
}
