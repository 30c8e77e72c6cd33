//! Quote tools over the WordPress `quote` custom post type.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::common::{ToolReply, clamp_per_page, default_per_page, fetch_list, id_string, path_segment};
use crate::domains::tools::{ToolContext, ToolResult, ToolSpec};
use crate::domains::upstream::{AuthMode, Backend, UpstreamRequest};

/// REST base of the quote post type.
const QUOTES: &str = "quote";

pub fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new("get_quotes", "List quote requests.", get_quotes),
        ToolSpec::new("get_quote", "Get a single quote request.", get_quote),
        ToolSpec::new(
            "create_quote",
            "Create a quote request (saved as a draft unless a status is given).",
            create_quote,
        ),
        ToolSpec::new("delete_quote", "Delete a quote request.", delete_quote).hidden(),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QuotesParams {
    #[schemars(description = "Number of quotes to return (default: 10, max: 100)")]
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[schemars(description = "Post status, e.g. publish, draft or pending")]
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QuoteIdParams {
    #[schemars(description = "Quote post ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub quote_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateQuoteParams {
    #[schemars(description = "Quote title")]
    pub title: String,

    #[schemars(description = "Quote body")]
    #[serde(default)]
    pub content: Option<String>,

    #[schemars(description = "Post status (default: draft)")]
    #[serde(default = "default_quote_status")]
    pub status: String,
}

fn default_quote_status() -> String {
    "draft".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteQuoteParams {
    #[schemars(description = "Quote post ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub quote_id: String,

    #[schemars(description = "Skip the trash and delete permanently (default: false)")]
    #[serde(default)]
    pub force: bool,
}

/// WordPress wraps titles as `{ "rendered": ... }`.
fn quote_summary(post: &Value) -> Value {
    json!({
        "id": post.get("id"),
        "date": post.get("date"),
        "status": post.get("status"),
        "title": post.get("title").and_then(|t| t.get("rendered")),
        "link": post.get("link"),
    })
}

async fn get_quotes(ctx: ToolContext, params: QuotesParams) -> ToolResult<ToolReply> {
    let request = UpstreamRequest::get(Backend::Cms, QUOTES)
        .query("per_page", clamp_per_page(params.per_page))
        .query_opt("status", params.status);

    let quotes = fetch_list(&ctx, request).await?;
    ToolReply::json(quotes.iter().map(quote_summary).collect::<Vec<_>>())
}

async fn get_quote(ctx: ToolContext, params: QuoteIdParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.quote_id)?;
    let request = UpstreamRequest::get(Backend::Cms, format!("{QUOTES}/{id}"));
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn create_quote(ctx: ToolContext, params: CreateQuoteParams) -> ToolResult<ToolReply> {
    let request = UpstreamRequest::post(Backend::Cms, QUOTES)
        .auth(AuthMode::Basic)
        .json(json!({
            "title": params.title,
            "content": params.content.unwrap_or_default(),
            "status": params.status,
        }));
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn delete_quote(ctx: ToolContext, params: DeleteQuoteParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.quote_id)?;
    let request = UpstreamRequest::delete(Backend::Cms, format!("{QUOTES}/{id}"))
        .query("force", params.force)
        .auth(AuthMode::Basic);
    Ok(ToolReply::Json(ctx.send(request).await?))
}
