//! Recording upstream used by the dispatcher tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::client::Upstream;
use super::error::UpstreamResult;
use super::request::UpstreamRequest;

type Responder = Box<dyn Fn(&UpstreamRequest) -> UpstreamResult + Send + Sync>;

/// Answers every request from a closure and remembers what was asked.
pub struct MockUpstream {
    responder: Responder,
    calls: Mutex<Vec<UpstreamRequest>>,
}

impl MockUpstream {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&UpstreamRequest) -> UpstreamResult + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with the same JSON value.
    pub fn returning(value: Value) -> Arc<Self> {
        Self::new(move |_| Ok(value.clone()))
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn send(&self, request: UpstreamRequest) -> UpstreamResult {
        let result = (self.responder)(&request);
        self.calls.lock().unwrap().push(request);
        result
    }
}
