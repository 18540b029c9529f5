//! Strategy Compiler service — thin transport shell over `compiler_core`
//! (spec.md §4.H). Shared between the two binaries in this crate:
//!
//! - `strategy-api` (`main.rs`): Axum HTTP server for the one REST endpoint
//!   and health checks spec.md §6 names.
//! - `strategy-mcp` (`bin/strategy_mcp.rs`): stdio MCP server exposing the
//!   rest of spec.md §6's tool surface to agents, grounded on
//!   `familiar-core`'s `bin/familiar_mcp.rs` + `mcp/` split between binary
//!   entrypoint and library-hosted tool implementations.
//!
//! Both binaries construct one [`state::AppState`] at startup and thread it
//! through; neither reaches for a module-level singleton (spec.md §9).

pub mod config;
pub mod http_error;
pub mod mcp;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
