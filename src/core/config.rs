//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (optionally via a `.env` file) on top of defaults.
//! Upstream credentials are deployment secrets; their `Debug` output is redacted.

use super::error::Result;
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Upstream backend locations.
    pub upstream: UpstreamConfig,

    /// Upstream backend credentials.
    pub credentials: CredentialsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Where each upstream backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the WordPress/WooCommerce site (`WC_URL`).
    pub store_url: Option<String>,

    /// REST namespace of the custom store plugin, e.g. `nova-b2b/v1`.
    pub plugin_namespace: String,

    /// Zendesk Support subdomain host, e.g. `acme.zendesk.com`.
    pub zendesk_domain: Option<String>,

    /// Zendesk Sell API base URL.
    pub sell_base_url: String,
}

/// Credentials for the upstream backends.
///
/// Secrets can be read from a serialized config but are never written out.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(skip_serializing)]
    pub wc_consumer_key: Option<String>,
    #[serde(skip_serializing)]
    pub wc_consumer_secret: Option<String>,
    #[serde(skip_serializing)]
    pub plugin_api_key: Option<String>,
    pub wp_username: Option<String>,
    #[serde(skip_serializing)]
    pub wp_app_password: Option<String>,
    pub zendesk_email: Option<String>,
    #[serde(skip_serializing)]
    pub zendesk_api_token: Option<String>,
    #[serde(skip_serializing)]
    pub sell_api_token: Option<String>,
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[REDACTED]")
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("wc_consumer_key", &redact(&self.wc_consumer_key))
            .field("wc_consumer_secret", &redact(&self.wc_consumer_secret))
            .field("plugin_api_key", &redact(&self.plugin_api_key))
            .field("wp_username", &self.wp_username)
            .field("wp_app_password", &redact(&self.wp_app_password))
            .field("zendesk_email", &self.zendesk_email)
            .field("zendesk_api_token", &redact(&self.zendesk_api_token))
            .field("sell_api_token", &redact(&self.sell_api_token))
            .finish()
    }
}

pub const DEFAULT_PLUGIN_NAMESPACE: &str = "nova-b2b/v1";
pub const DEFAULT_SELL_BASE_URL: &str = "https://api.getbase.com/v2";

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            plugin_namespace: DEFAULT_PLUGIN_NAMESPACE.to_string(),
            zendesk_domain: None,
            sell_base_url: DEFAULT_SELL_BASE_URL.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "commerce-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            upstream: UpstreamConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

/// Read a non-empty environment variable.
pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Missing upstream settings only produce warnings: the tools that need
    /// them answer with an error naming the variable.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(name) = env_var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = env_var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env()?;

        config.upstream.store_url = env_var("WC_URL");
        if config.upstream.store_url.is_none() {
            warn!("WC_URL not set - store, plugin and quote tools will be unavailable");
        }
        if let Some(namespace) = env_var("PLUGIN_NAMESPACE") {
            config.upstream.plugin_namespace = namespace.trim_matches('/').to_string();
        }
        config.upstream.zendesk_domain = env_var("ZENDESK_DOMAIN");
        if let Some(url) = env_var("ZENDESK_SELL_BASE_URL") {
            config.upstream.sell_base_url = url;
        }

        config.credentials = CredentialsConfig {
            wc_consumer_key: env_var("WC_CONSUMER_KEY"),
            wc_consumer_secret: env_var("WC_CONSUMER_SECRET"),
            plugin_api_key: env_var("PLUGIN_API_KEY"),
            wp_username: env_var("WP_USERNAME"),
            wp_app_password: env_var("WP_APP_PASSWORD"),
            zendesk_email: env_var("ZENDESK_EMAIL"),
            zendesk_api_token: env_var("ZENDESK_API_TOKEN"),
            sell_api_token: env_var("ZENDESK_SELL_API_TOKEN"),
        };
        info!("Upstream credentials loaded: {:?}", config.credentials);

        Ok(config)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    pub(crate) static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_upstream_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("WC_URL", "https://shop.example.com");
            std::env::set_var("PLUGIN_NAMESPACE", "/acme/v2/");
            std::env::set_var("ZENDESK_SELL_API_TOKEN", "sell_token_123");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.upstream.store_url.as_deref(),
            Some("https://shop.example.com")
        );
        assert_eq!(config.upstream.plugin_namespace, "acme/v2");
        assert_eq!(
            config.credentials.sell_api_token.as_deref(),
            Some("sell_token_123")
        );
        unsafe {
            std::env::remove_var("WC_URL");
            std::env::remove_var("PLUGIN_NAMESPACE");
            std::env::remove_var("ZENDESK_SELL_API_TOKEN");
        }
    }

    #[test]
    fn test_serialized_config_omits_secrets() {
        let mut config = Config::default();
        config.credentials = CredentialsConfig {
            wc_consumer_key: Some("ck_live_1".into()),
            wc_consumer_secret: Some("cs_live_2".into()),
            plugin_api_key: Some("plugin_3".into()),
            wp_username: Some("editor".into()),
            wp_app_password: Some("app_pw_4".into()),
            zendesk_email: Some("ops@example.com".into()),
            zendesk_api_token: Some("zd_5".into()),
            sell_api_token: Some("sell_6".into()),
        };

        let rendered = serde_json::to_string(&config).unwrap();
        for secret in ["ck_live_1", "cs_live_2", "plugin_3", "app_pw_4", "zd_5", "sell_6"] {
            assert!(!rendered.contains(secret), "{secret} leaked");
        }
        assert!(rendered.contains("editor"));

        let restored: Config = serde_json::from_str(&rendered).unwrap();
        assert!(restored.credentials.sell_api_token.is_none());
    }

    #[test]
    fn test_blank_env_is_unset() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("ZENDESK_EMAIL", "   ");
        }
        let config = Config::from_env().unwrap();
        assert!(config.credentials.zendesk_email.is_none());
        unsafe {
            std::env::remove_var("ZENDESK_EMAIL");
        }
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            wc_consumer_secret: Some("cs_super_secret".to_string()),
            sell_api_token: Some("sell_secret".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("cs_super_secret"));
        assert!(!debug_str.contains("sell_secret"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.upstream.plugin_namespace, DEFAULT_PLUGIN_NAMESPACE);
        assert_eq!(config.upstream.sell_base_url, DEFAULT_SELL_BASE_URL);
        assert!(config.upstream.store_url.is_none());
    }
}
