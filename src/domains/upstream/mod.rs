//! Upstream REST backends.
//!
//! Every tool ends in exactly one kind of side effect: an HTTP request to one
//! of the configured backends. This module owns that boundary:
//!
//! - `request.rs` - backend/auth-mode enums and the request builder
//! - `auth.rs` - per-backend credential material (read once at start-up)
//! - `client.rs` - the `Upstream` trait and its reqwest implementation
//! - `error.rs` - the `{error: message}` descriptor every failure becomes
//!
//! Nothing that goes wrong in here is allowed to escape as a panic or a
//! transport exception: it always comes back as an `UpstreamError`.

mod auth;
mod client;
mod error;
mod request;

#[cfg(test)]
pub mod mock;

pub use auth::{AuthContext, BasicCredentials};
pub use client::{HttpUpstream, REQUEST_TIMEOUT_SECS, Upstream, normalize_response};
pub use error::{UpstreamError, UpstreamResult};
pub use request::{AuthMode, Backend, UpstreamRequest};
