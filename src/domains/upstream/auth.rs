//! Per-backend credential material.
//!
//! Built once from `CredentialsConfig` before the transport starts and shared
//! read-only afterwards. Header values are precomputed so a request only has
//! to pick one.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::error::UpstreamError;
use super::request::{AuthMode, Backend};
use crate::core::config::CredentialsConfig;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// An HTTP basic credential pair, stored as its ready-made header value.
#[derive(Clone)]
pub struct BasicCredentials {
    header: String,
}

impl BasicCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        Self {
            header: format!("Basic {encoded}"),
        }
    }

    fn from_pair(username: &Option<String>, password: &Option<String>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) => Some(Self::new(u, p)),
            _ => None,
        }
    }

    pub fn header_value(&self) -> &str {
        &self.header
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BasicCredentials([REDACTED])")
    }
}

/// Credentials for every backend.
#[derive(Clone, Default)]
pub struct AuthContext {
    store: Option<BasicCredentials>,
    site_admin: Option<BasicCredentials>,
    helpdesk: Option<BasicCredentials>,
    plugin_api_key: Option<String>,
    crm_token: Option<String>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("store", &self.store.is_some())
            .field("site_admin", &self.site_admin.is_some())
            .field("helpdesk", &self.helpdesk.is_some())
            .field("plugin_api_key", &self.plugin_api_key.is_some())
            .field("crm_token", &self.crm_token.is_some())
            .finish()
    }
}

impl AuthContext {
    pub fn from_credentials(creds: &CredentialsConfig) -> Self {
        // Zendesk API tokens authenticate as "{email}/token" with the token as password.
        let helpdesk = match (&creds.zendesk_email, &creds.zendesk_api_token) {
            (Some(email), Some(token)) => Some(BasicCredentials::new(&format!("{email}/token"), token)),
            _ => None,
        };

        Self {
            store: BasicCredentials::from_pair(&creds.wc_consumer_key, &creds.wc_consumer_secret),
            site_admin: BasicCredentials::from_pair(&creds.wp_username, &creds.wp_app_password),
            helpdesk,
            plugin_api_key: creds.plugin_api_key.clone(),
            crm_token: creds.sell_api_token.clone(),
        }
    }

    /// The header to attach for `mode` on `backend`, or `None` for public calls.
    pub fn header_for(
        &self,
        backend: Backend,
        mode: AuthMode,
    ) -> Result<Option<(&'static str, String)>, UpstreamError> {
        match mode {
            AuthMode::None => Ok(None),
            AuthMode::Basic => {
                let (creds, what, vars) = match backend {
                    Backend::Store => (
                        &self.store,
                        "WooCommerce credentials",
                        "WC_CONSUMER_KEY, WC_CONSUMER_SECRET",
                    ),
                    Backend::Plugin | Backend::Cms => (
                        &self.site_admin,
                        "WordPress credentials",
                        "WP_USERNAME, WP_APP_PASSWORD",
                    ),
                    Backend::Helpdesk => (
                        &self.helpdesk,
                        "Zendesk credentials",
                        "ZENDESK_EMAIL, ZENDESK_API_TOKEN",
                    ),
                    Backend::Crm => return Err(unsupported(backend, mode)),
                };
                creds
                    .as_ref()
                    .map(|c| Some((AUTHORIZATION_HEADER, c.header_value().to_string())))
                    .ok_or_else(|| UpstreamError::missing_credentials(what, vars))
            }
            AuthMode::ApiKey => match backend {
                Backend::Store | Backend::Plugin | Backend::Cms => self
                    .plugin_api_key
                    .as_ref()
                    .map(|key| Some((API_KEY_HEADER, key.clone())))
                    .ok_or_else(|| {
                        UpstreamError::missing_credentials("Plugin API key", "PLUGIN_API_KEY")
                    }),
                _ => Err(unsupported(backend, mode)),
            },
            AuthMode::Bearer => match backend {
                Backend::Crm => self
                    .crm_token
                    .as_ref()
                    .map(|token| Some((AUTHORIZATION_HEADER, format!("Bearer {token}"))))
                    .ok_or_else(|| {
                        UpstreamError::missing_credentials(
                            "Zendesk Sell API token",
                            "ZENDESK_SELL_API_TOKEN",
                        )
                    }),
                _ => Err(unsupported(backend, mode)),
            },
        }
    }
}

fn unsupported(backend: Backend, mode: AuthMode) -> UpstreamError {
    UpstreamError::new(format!(
        "{mode:?} authentication is not supported for the {} backend",
        backend.name()
    ))
}
