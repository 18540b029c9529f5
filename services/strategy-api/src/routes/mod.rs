//! HTTP routes.
//!
//! spec.md §6 names exactly one REST endpoint (`GET /api/strategies/{id}`)
//! plus health checks; everything else in the tool surface is exposed over
//! MCP (`src/mcp/tools.rs`). The HTTP side exists only for that one endpoint
//! and for liveness/readiness probes a transport-agnostic tool surface can't
//! serve.

pub mod health;
pub mod strategies;
