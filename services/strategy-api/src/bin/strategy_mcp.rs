//! Strategy Compiler MCP server
//!
//! Model Context Protocol server exposing the archetype catalog, card and
//! strategy CRUD, and the compiler (spec.md §6) to agents over stdio.
//! Grounded on `familiar-core/src/bin/familiar_mcp.rs`: parse args, build the
//! shared state once, construct the tools handler, `serve_stdio`.
//!
//! ## Usage
//!
//! ```bash
//! strategy-mcp
//! ```

use std::sync::Arc;

use clap::Parser;
use mcp_attr::server::serve_stdio;
use strategy_api::config::AppConfig;
use strategy_api::mcp::StrategyTools;
use strategy_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "strategy-mcp")]
#[command(about = "MCP server for the strategy compiler catalog, cards, strategies, and compiler")]
#[command(version)]
struct Args {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _args = Args::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "strategy_mcp=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let app_config = AppConfig::load()
        .expect("Failed to load configuration. Please ensure config.toml exists and environment variables are set correctly.");
    let catalog_dir = app_config.catalog_dir();

    let state = match AppState::new(app_config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("database connection failed: {e}. running without persistence.");
            AppState::without_db(&catalog_dir)
        }
    };

    eprintln!("strategy-mcp: catalog loaded, ready on stdio");

    let tools = StrategyTools::new(Arc::clone(&state.service));
    serve_stdio(tools).await?;

    Ok(())
}
