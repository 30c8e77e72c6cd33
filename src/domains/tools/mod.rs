//! Tools domain module.
//!
//! Tools are the only surface this server exposes: each one maps its
//! arguments onto a request against an upstream backend and reshapes the
//! response into a single text block.
//!
//! ## Architecture
//!
//! - `definitions/` - tool definitions, one file per backend
//! - `registry.rs` - the name → handler table used for listing and dispatch
//! - `aggregate.rs` - pure summarizing functions over fetched collections
//! - `context.rs` - the shared context handed to every handler
//! - `error.rs` - tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Define a params struct (`Deserialize + JsonSchema`) and an async handler
//!    in the matching file under `definitions/`
//! 2. Add a `ToolSpec::new(...)` entry to that file's `tools()` list
//!
//! Listing and dispatch both read from the registry, so nothing else changes.

pub mod aggregate;
mod context;
pub mod definitions;
mod error;
mod registry;

pub use context::ToolContext;
pub use error::{ToolError, ToolResult};
pub use registry::{ToolRegistry, ToolSpec};
