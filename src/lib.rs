//! Commerce MCP Server Library
//!
//! This crate exposes a WooCommerce store, its companion WordPress plugin,
//! Zendesk Support and Zendesk Sell as Model Context Protocol tools.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Configuration, error handling, the MCP server handler and the
//!   STDIO / SSE transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: tool definitions, the dispatch registry and aggregation helpers
//!   - **upstream**: authenticated REST access to the backends
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use commerce_mcp_server::core::{Config, McpServer};
//! use commerce_mcp_server::domains::tools::ToolContext;
//! use commerce_mcp_server::domains::upstream::{AuthContext, HttpUpstream};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let auth = AuthContext::from_credentials(&config.credentials);
//!     let upstream = HttpUpstream::new(config.upstream.clone(), auth)?;
//!     let server = McpServer::new(config, ToolContext::new(Arc::new(upstream)));
//!     // Hand the server to a transport...
//!     # let _ = server;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
