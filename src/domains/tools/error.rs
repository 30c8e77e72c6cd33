//! Tool-specific error types.

use thiserror::Error;

use crate::domains::upstream::UpstreamError;

/// A specialized Result type for tool handlers.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors that can occur during tool operations.
///
/// None of these abort the call: the dispatcher renders them as an
/// `Error: <message>` text result.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Required arguments were absent, null or blank.
    #[error("{}", describe_missing(.0))]
    MissingArguments(Vec<String>),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The upstream backend call failed.
    #[error("{0}")]
    Upstream(#[from] UpstreamError),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

fn describe_missing(names: &[String]) -> String {
    match names {
        [] => "arguments are required".to_string(),
        [one] => format!("{one} is required"),
        [init @ .., last] => format!("{} and {last} are required", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_messages() {
        assert_eq!(
            ToolError::MissingArguments(vec!["query".into()]).to_string(),
            "query is required"
        );
        assert_eq!(
            ToolError::MissingArguments(vec!["ticket_id".into(), "comment".into()]).to_string(),
            "ticket_id and comment are required"
        );
        assert_eq!(
            ToolError::MissingArguments(vec!["a".into(), "b".into(), "c".into()]).to_string(),
            "a, b and c are required"
        );
    }

    #[test]
    fn test_upstream_message_passthrough() {
        let err = ToolError::from(UpstreamError::new("Invalid ID"));
        assert_eq!(err.to_string(), "Invalid ID");
    }
}
