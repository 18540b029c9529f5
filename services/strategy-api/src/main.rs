//! Strategy Compiler API — HTTP facade
//!
//! This binary serves the one REST endpoint and health checks spec.md §6
//! names. The full tool surface (catalog browsing, card/strategy CRUD,
//! `validate_strategy`/`compile_strategy`) is exposed by the sibling
//! `strategy-mcp` binary (`src/bin/strategy_mcp.rs`) over stdio MCP — that is
//! the primary way an agent talks to this service. Both binaries share the
//! same `compiler_core::StrategyService`, wired once per process the way
//! `familiar-api`'s `AppState` wires its stores once at startup (spec.md §9:
//! no per-tool inline closures capturing mutable repository handles).

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use strategy_api::config::AppConfig;
use strategy_api::state::AppState;
use strategy_api::{middleware, openapi, routes};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let app_config = AppConfig::load()
        .expect("Failed to load configuration. Please ensure config.toml exists and environment variables are set correctly.");

    let port = app_config.server.port;
    let catalog_dir = app_config.catalog_dir();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strategy_api=debug,tower_http=debug".into()),
        )
        .init();

    let state = match AppState::new(app_config).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::warn!("database connection failed: {e}. running without persistence.");
            Arc::new(AppState::without_db(&catalog_dir))
        }
    };

    // Public: health/readiness, unauthenticated by spec.md §6's auth rule.
    let public_routes = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/health", get(routes::health::health_check))
        .route("/ready", get(routes::health::ready_check));

    // Protected: the one REST endpoint, bearer-gated when AUTH_TOKEN is set.
    let protected_routes = Router::new()
        .route(
            "/api/strategies/:id",
            get(routes::strategies::get_strategy_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(openapi::swagger_ui())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    info!("strategy-api starting on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));

    info!("listener bound, starting axum server");
    axum::serve(listener, app).await.unwrap();
}
