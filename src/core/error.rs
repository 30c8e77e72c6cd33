//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type for start-up and transport level
//! failures. Tool-level failures never reach it: the dispatcher turns them
//! into error-flagged tool results.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error raised while constructing an upstream client.
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::domains::upstream::UpstreamError),

    /// Error raised by the transport layer.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
