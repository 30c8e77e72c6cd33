//! Shared context handed to every tool handler.

use std::sync::Arc;

use crate::domains::upstream::{Upstream, UpstreamRequest, UpstreamResult};

/// Explicitly constructed at start-up and cloned into each invocation.
///
/// Holds only read-only state; handlers keep nothing between calls.
#[derive(Clone)]
pub struct ToolContext {
    upstream: Arc<dyn Upstream>,
}

impl ToolContext {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Perform one upstream round trip.
    pub async fn send(&self, request: UpstreamRequest) -> UpstreamResult {
        self.upstream.send(request).await
    }
}
