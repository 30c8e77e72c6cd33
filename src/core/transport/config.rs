//! Transport configuration types.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

#[cfg(feature = "http")]
use crate::core::config::env_var;

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// SSE stream plus POST endpoint, gated by a shared API key.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP (SSE) transport configuration.
#[cfg(feature = "http")]
#[derive(Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Shared secret expected in `X-API-Key` or `?api_key=`.
    /// When unset every gated request is answered with 500. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[cfg(feature = "http")]
impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("enable_cors", &self.enable_cors)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
const DEFAULT_PORT: u16 = 8000;

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: default_host(),
            enable_cors: default_cors(),
            api_key: None,
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an HTTP (SSE) transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>, api_key: Option<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            api_key,
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects the transport (`stdio`, `sse` or `http`).
    pub fn from_env() -> Result<Self> {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "sse" | "http" => Ok(Self::Http(HttpConfig::from_env()?)),
            #[cfg(not(feature = "http"))]
            "sse" | "http" => Err(Error::config(
                "MCP_TRANSPORT=sse requires building with the `http` feature",
            )),
            #[cfg(feature = "stdio")]
            "" | "stdio" => Ok(Self::Stdio),
            #[cfg(not(feature = "stdio"))]
            "" => Ok(Self::default()),
            #[cfg(not(feature = "stdio"))]
            "stdio" => Err(Error::config(
                "MCP_TRANSPORT=stdio requires building with the `stdio` feature",
            )),
            other => Err(Error::config(format!(
                "unknown MCP_TRANSPORT value '{other}' (expected stdio or sse)"
            ))),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("SSE over HTTP on {}:{}", cfg.host, cfg.port),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Load the HTTP settings: `PORT`, `MCP_HTTP_HOST`, `MCP_HTTP_CORS`, `MCP_SSE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let port = match env_var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("PORT must be a port number, got '{raw}'")))?,
            None => DEFAULT_PORT,
        };
        let host = env_var("MCP_HTTP_HOST").unwrap_or_else(default_host);
        let enable_cors = env_var("MCP_HTTP_CORS")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);
        let api_key = env_var("MCP_SSE_API_KEY");
        if api_key.is_none() {
            tracing::warn!("MCP_SSE_API_KEY not set - SSE endpoints will answer 500");
        }

        Ok(Self {
            port,
            host,
            enable_cors,
            api_key,
        })
    }
}
