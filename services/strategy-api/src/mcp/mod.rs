//! MCP server for the strategy catalog, card/strategy CRUD, and compiler
//! (spec.md §6's tool surface), grounded on `familiar-core::mcp`'s split
//! between a tool-implementation module and the `bin/familiar_mcp.rs`
//! entrypoint that wires it to `mcp_attr::server::serve_stdio`.

pub mod tools;

pub use tools::StrategyTools;
