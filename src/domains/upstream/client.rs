//! HTTP client for the upstream backends.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::auth::AuthContext;
use super::error::{UpstreamError, UpstreamResult};
use super::request::{Backend, UpstreamRequest};
use crate::core::config::UpstreamConfig;

/// Fixed per-request timeout. Requests are never retried.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Something that can carry out an upstream request.
///
/// Tools only ever see this trait, so tests can swap in a recording mock.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> UpstreamResult;
}

/// reqwest-backed implementation talking to the real backends.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    endpoints: UpstreamConfig,
    auth: AuthContext,
}

impl HttpUpstream {
    pub fn new(endpoints: UpstreamConfig, auth: AuthContext) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("commerce-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::new(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoints,
            auth,
        })
    }

    /// Base URL of a backend, without a trailing slash.
    fn base_url(&self, backend: Backend) -> Result<String, UpstreamError> {
        let store = || {
            self.endpoints
                .store_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string())
                .ok_or_else(|| UpstreamError::new("Store URL (WC_URL) not configured"))
        };

        match backend {
            Backend::Store => Ok(format!("{}/wp-json/wc/v3", store()?)),
            Backend::Plugin => Ok(format!(
                "{}/wp-json/{}",
                store()?,
                self.endpoints.plugin_namespace.trim_matches('/')
            )),
            Backend::Cms => Ok(format!("{}/wp-json/wp/v2", store()?)),
            Backend::Helpdesk => {
                let domain = self
                    .endpoints
                    .zendesk_domain
                    .as_deref()
                    .ok_or_else(|| UpstreamError::new("Zendesk domain (ZENDESK_DOMAIN) not configured"))?
                    .trim_end_matches('/');
                if domain.starts_with("http://") || domain.starts_with("https://") {
                    Ok(format!("{domain}/api/v2"))
                } else {
                    Ok(format!("https://{domain}/api/v2"))
                }
            }
            Backend::Crm => Ok(self.endpoints.sell_base_url.trim_end_matches('/').to_string()),
        }
    }

    fn url_for(&self, request: &UpstreamRequest) -> Result<String, UpstreamError> {
        Ok(format!(
            "{}/{}",
            self.base_url(request.backend)?,
            request.path.trim_start_matches('/')
        ))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    #[instrument(skip_all, fields(backend = request.backend.name(), method = %request.method, path = %request.path))]
    async fn send(&self, request: UpstreamRequest) -> UpstreamResult {
        let url = self.url_for(&request)?;
        let auth_header = self.auth.header_for(request.backend, request.auth)?;

        debug!("Upstream request: {} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some((name, value)) = auth_header {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("Upstream request to {} failed: {}", url, e);
            UpstreamError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?;

        let result = normalize_response(status, &body, request.backend.error_field(), &url);
        if let Err(e) = &result {
            warn!("Upstream {} answered {}: {}", request.backend.name(), status, e);
        }
        result
    }
}

/// Turn a status code and raw body into the uniform upstream outcome.
///
/// - `204` (or an empty 2xx body) becomes `{"success": true}`
/// - other 2xx bodies are returned as decoded JSON
/// - failures prefer the backend's `error_field`, falling back to the status line
pub fn normalize_response(
    status: StatusCode,
    body: &[u8],
    error_field: &str,
    url: &str,
) -> UpstreamResult {
    if status.is_success() {
        if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::json!({ "success": true }));
        }
        return serde_json::from_slice(body)
            .map_err(|e| UpstreamError::new(format!("Invalid JSON response from {url}: {e}")));
    }

    let backend_message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|json| json.get(error_field).cloned())
        .and_then(|field| match field {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

    Err(UpstreamError::new(backend_message.unwrap_or_else(|| {
        let kind = if status.is_client_error() {
            "Client Error"
        } else {
            "Server Error"
        };
        format!(
            "{} {}: {} for url: {}",
            status.as_u16(),
            kind,
            status.canonical_reason().unwrap_or("Unknown"),
            url
        )
    })))
}
