//! The error descriptor returned by every upstream call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of one upstream call: the decoded JSON body or an error descriptor.
pub type UpstreamResult = Result<serde_json::Value, UpstreamError>;

/// A normalized upstream failure.
///
/// Serializes as `{"error": "<message>"}`. The message prefers the backend's
/// own human-readable error field over the generic HTTP/transport text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{error}")]
pub struct UpstreamError {
    pub error: String,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Credentials required by the selected auth mode are not configured.
    pub fn missing_credentials(what: &str, variables: &str) -> Self {
        Self::new(format!("{what} ({variables}) not configured"))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::new(format!("Request timed out: {err}"));
        }
        Self::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_descriptor() {
        let err = UpstreamError::new("Invalid ID");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "error": "Invalid ID" })
        );
        assert_eq!(err.to_string(), "Invalid ID");
    }
}
