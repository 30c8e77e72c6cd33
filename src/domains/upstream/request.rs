//! Upstream request description.

use reqwest::Method;
use serde_json::Value;

/// The REST backends a tool can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// WooCommerce REST API (`wp-json/wc/v3`).
    Store,
    /// The custom store plugin namespace (`wp-json/<namespace>`).
    Plugin,
    /// WordPress core REST API (`wp-json/wp/v2`), used for the quote post type.
    Cms,
    /// Zendesk Support (`/api/v2`).
    Helpdesk,
    /// Zendesk Sell.
    Crm,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Plugin => "plugin",
            Self::Cms => "cms",
            Self::Helpdesk => "helpdesk",
            Self::Crm => "crm",
        }
    }

    /// Field of a JSON error body holding the human-readable message.
    pub fn error_field(self) -> &'static str {
        match self {
            Self::Store | Self::Plugin | Self::Cms => "message",
            Self::Helpdesk => "description",
            Self::Crm => "errors",
        }
    }
}

/// How a request authenticates. Chosen explicitly by each tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Public endpoint, no credentials attached.
    #[default]
    None,
    /// `X-API-Key` header with the plugin API key.
    ApiKey,
    /// HTTP basic credentials of the backend.
    Basic,
    /// `Authorization: Bearer` token.
    Bearer,
}

/// One HTTP call against a backend, relative to that backend's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub backend: Backend,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub auth: AuthMode,
}

impl UpstreamRequest {
    pub fn new(backend: Backend, method: Method, path: impl Into<String>) -> Self {
        Self {
            backend,
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth: AuthMode::None,
        }
    }

    pub fn get(backend: Backend, path: impl Into<String>) -> Self {
        Self::new(backend, Method::GET, path)
    }

    pub fn post(backend: Backend, path: impl Into<String>) -> Self {
        Self::new(backend, Method::POST, path)
    }

    pub fn put(backend: Backend, path: impl Into<String>) -> Self {
        Self::new(backend, Method::PUT, path)
    }

    pub fn delete(backend: Backend, path: impl Into<String>) -> Self {
        Self::new(backend, Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present.
    pub fn query_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn auth(mut self, mode: AuthMode) -> Self {
        self.auth = mode;
        self
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
