//! Common utilities shared across tool definitions.
//!
//! This module provides the reply type every handler returns, argument
//! helpers (identifiers, page sizes) and the list/pagination helpers used
//! by tools that read collections.

use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domains::tools::context::ToolContext;
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::upstream::{UpstreamError, UpstreamRequest};

/// Page size used when walking a whole collection.
pub const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched by [`paginate`].
pub const MAX_PAGES: usize = 500;

/// What a tool hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolReply {
    /// Rendered as pretty-printed JSON.
    Json(Value),
    /// A plain status line.
    Text(String),
}

impl ToolReply {
    pub fn json<T: Serialize>(value: T) -> ToolResult<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ToolError::internal(e.to_string()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Convert into a successful result with exactly one text block.
    pub fn into_call_result(self) -> CallToolResult {
        let text = match self {
            Self::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
            Self::Text(text) => text,
        };
        CallToolResult::success(vec![Content::text(text)])
    }
}

/// Parameters for tools that take no arguments.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

// ============================================================================
// Identifiers
// ============================================================================

/// An identifier as clients send it: a JSON string or a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Float(f) if f.fract() == 0.0 => (f as i64).to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

/// Deserialize a required identifier given as a string or an integer.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RawId::into_string)
}

/// Optional variant of [`id_string`]; `null` and blank strings become `None`.
pub fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawId> = Option::deserialize(deserializer)?;
    Ok(raw.map(RawId::into_string).filter(|s| !s.is_empty()))
}

/// Check that an identifier stays within its own URL path segment.
pub fn path_segment(id: &str) -> ToolResult<&str> {
    let escapes = id == "."
        || id == ".."
        || id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace());

    if id.is_empty() || escapes {
        Err(ToolError::invalid_arguments(format!("'{id}' is not a valid identifier")))
    } else {
        Ok(id)
    }
}

// ============================================================================
// Paging
// ============================================================================

/// Default page size for list tools.
pub fn default_per_page() -> u32 {
    10
}

/// Clamp a requested page size to 1..=100.
pub fn clamp_per_page(per_page: u32) -> u32 {
    per_page.clamp(1, PAGE_SIZE as u32)
}

pub fn default_page() -> u32 {
    1
}

// ============================================================================
// Response shaping
// ============================================================================

/// Copy only `fields` out of an object; absent fields become `null`.
pub fn pick(item: &Value, fields: &[&str]) -> Value {
    let picked: Map<String, Value> = fields
        .iter()
        .map(|f| ((*f).to_string(), item.get(*f).cloned().unwrap_or(Value::Null)))
        .collect();
    Value::Object(picked)
}

pub fn pick_all(items: &[Value], fields: &[&str]) -> Vec<Value> {
    items.iter().map(|item| pick(item, fields)).collect()
}

/// Send a request whose answer must be a JSON array.
pub async fn fetch_list(
    ctx: &ToolContext,
    request: UpstreamRequest,
) -> Result<Vec<Value>, UpstreamError> {
    let path = request.path.clone();
    match ctx.send(request).await? {
        Value::Array(items) => Ok(items),
        other => Err(UpstreamError::new(format!(
            "Expected a list from {path}, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Fetch every page of a collection.
///
/// Pages of [`PAGE_SIZE`] items are requested from page 1 until a short or
/// empty page, stopping after [`MAX_PAGES`]. The first failing page fails
/// the whole walk.
pub async fn paginate(
    ctx: &ToolContext,
    request: UpstreamRequest,
) -> Result<Vec<Value>, UpstreamError> {
    let mut all = Vec::new();

    for page in 1..=MAX_PAGES {
        let page_request = request
            .clone()
            .query("per_page", PAGE_SIZE)
            .query("page", page);
        let items = fetch_list(ctx, page_request).await?;
        let count = items.len();
        all.extend(items);

        if count < PAGE_SIZE {
            debug!("Fetched {} items from {} in {} page(s)", all.len(), request.path, page);
            return Ok(all);
        }
    }

    warn!(
        "Stopped paging {} after {} pages ({} items)",
        request.path,
        MAX_PAGES,
        all.len()
    );
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::text_of;
    use crate::domains::upstream::Backend;
    use crate::domains::upstream::mock::MockUpstream;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Ids {
        #[serde(deserialize_with = "id_string")]
        id: String,
        #[serde(default, deserialize_with = "opt_id_string")]
        other: Option<String>,
    }

    #[test]
    fn test_ids_accept_strings_and_integers() {
        let ids: Ids = serde_json::from_value(json!({ "id": 42, "other": " 7 " })).unwrap();
        assert_eq!(ids.id, "42");
        assert_eq!(ids.other.as_deref(), Some("7"));

        let ids: Ids = serde_json::from_value(json!({ "id": "abc", "other": null })).unwrap();
        assert_eq!(ids.id, "abc");
        assert!(ids.other.is_none());

        let ids: Ids = serde_json::from_value(json!({ "id": 12.0 })).unwrap();
        assert_eq!(ids.id, "12");

        assert!(serde_json::from_value::<Ids>(json!({ "id": [1] })).is_err());
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("123").unwrap(), "123");
        assert!(path_segment("12/../users").is_err());
        assert!(path_segment("..").is_err());
        assert!(path_segment("1?x=2").is_err());
        assert!(path_segment("").is_err());
    }

    #[test]
    fn test_clamp_per_page() {
        assert_eq!(clamp_per_page(10), 10);
        assert_eq!(clamp_per_page(0), 1);
        assert_eq!(clamp_per_page(500), 100);
    }

    #[test]
    fn test_pick() {
        let item = json!({ "id": 1, "name": "Sign", "secret": "x" });
        assert_eq!(pick(&item, &["id", "name", "sku"]), json!({ "id": 1, "name": "Sign", "sku": null }));
    }

    #[test]
    fn test_reply_rendering() {
        let result = ToolReply::Json(json!({ "a": 1 })).into_call_result();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.content.len(), 1);

        let result = ToolReply::text("No orders found in date range").into_call_result();
        assert_eq!(text_of(&result), "No orders found in date range");
    }

    #[tokio::test]
    async fn test_paginate_stops_on_short_page() {
        let upstream = MockUpstream::new(|request| {
            let page: usize = request.query_value("page").unwrap().parse().unwrap();
            let remaining = 250usize.saturating_sub((page - 1) * PAGE_SIZE);
            let items = (0..remaining.min(PAGE_SIZE)).map(|i| json!({ "i": i })).collect();
            Ok(Value::Array(items))
        });
        let ctx = ToolContext::new(upstream.clone());

        let items = paginate(&ctx, UpstreamRequest::get(Backend::Store, "products"))
            .await
            .unwrap();
        assert_eq!(items.len(), 250);
        assert_eq!(upstream.call_count(), 3);

        let calls = upstream.calls();
        assert_eq!(calls[0].query_value("per_page"), Some("100"));
        assert_eq!(calls[2].query_value("page"), Some("3"));
    }

    #[tokio::test]
    async fn test_paginate_exact_multiple_needs_empty_page() {
        let upstream = MockUpstream::new(|request| {
            let page = request.query_value("page").unwrap();
            let count = if page == "1" { PAGE_SIZE } else { 0 };
            Ok(Value::Array(vec![json!({}); count]))
        });
        let ctx = ToolContext::new(upstream.clone());

        let items = paginate(&ctx, UpstreamRequest::get(Backend::Store, "orders"))
            .await
            .unwrap();
        assert_eq!(items.len(), PAGE_SIZE);
        assert_eq!(upstream.call_count(), 2);
    }

    #[tokio::test]
    async fn test_paginate_propagates_errors() {
        let upstream = MockUpstream::new(|_| Err(UpstreamError::new("Invalid ID")));
        let ctx = ToolContext::new(upstream.clone());

        let err = paginate(&ctx, UpstreamRequest::get(Backend::Store, "orders"))
            .await
            .unwrap_err();
        assert_eq!(err, UpstreamError::new("Invalid ID"));
        assert_eq!(upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_list_rejects_objects() {
        let ctx = ToolContext::new(MockUpstream::returning(json!({ "code": "oops" })));
        let err = fetch_list(&ctx, UpstreamRequest::get(Backend::Store, "orders"))
            .await
            .unwrap_err();
        assert_eq!(err.error, "Expected a list from orders, got an object");
    }
}
