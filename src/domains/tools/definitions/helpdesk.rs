//! Zendesk Support tools.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::common::{ToolReply, id_string, path_segment};
use crate::domains::tools::{ToolContext, ToolResult, ToolSpec};
use crate::domains::upstream::{AuthMode, Backend, UpstreamRequest};

pub fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "search_zendesk_tickets",
            "Search for Zendesk tickets using Zendesk search query syntax.",
            search_tickets,
        ),
        ToolSpec::new(
            "get_zendesk_ticket",
            "Get details of a specific Zendesk ticket by ID.",
            get_ticket,
        ),
        ToolSpec::new(
            "get_zendesk_ticket_comments",
            "Retrieve all comments for a specific Zendesk ticket.",
            get_ticket_comments,
        ),
        ToolSpec::new(
            "add_zendesk_ticket_comment",
            "Add a comment (reply or internal note) to a Zendesk ticket.",
            add_ticket_comment,
        ),
        ToolSpec::new(
            "search_zendesk_users",
            "Search for Zendesk users by email, name, or phone.",
            search_users,
        ),
    ]
}

fn helpdesk(request: UpstreamRequest) -> UpstreamRequest {
    request.auth(AuthMode::Basic)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Zendesk search query (e.g. 'status<solved order_id:12345')")]
    pub query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TicketParams {
    #[schemars(description = "The Zendesk ticket ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub ticket_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CommentParams {
    #[schemars(description = "The Zendesk ticket ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub ticket_id: String,

    #[schemars(description = "The comment text")]
    pub comment: String,

    #[schemars(description = "Whether the comment is public (visible to requester) or internal")]
    #[serde(default = "default_public")]
    pub public: bool,
}

fn default_public() -> bool {
    true
}

async fn search_tickets(ctx: ToolContext, params: SearchParams) -> ToolResult<ToolReply> {
    let request = helpdesk(UpstreamRequest::get(Backend::Helpdesk, "search.json"))
        .query("query", params.query);
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_ticket(ctx: ToolContext, params: TicketParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.ticket_id)?;
    let request = helpdesk(UpstreamRequest::get(Backend::Helpdesk, format!("tickets/{id}.json")));
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_ticket_comments(ctx: ToolContext, params: TicketParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.ticket_id)?;
    let request = helpdesk(UpstreamRequest::get(
        Backend::Helpdesk,
        format!("tickets/{id}/comments.json"),
    ));
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn add_ticket_comment(ctx: ToolContext, params: CommentParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.ticket_id)?;
    let request = helpdesk(UpstreamRequest::put(Backend::Helpdesk, format!("tickets/{id}.json")))
        .json(json!({
            "ticket": {
                "comment": {
                    "body": params.comment,
                    "public": params.public,
                }
            }
        }));
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn search_users(ctx: ToolContext, params: SearchParams) -> ToolResult<ToolReply> {
    let request = helpdesk(UpstreamRequest::get(Backend::Helpdesk, "users/search.json"))
        .query("query", params.query);
    Ok(ToolReply::Json(ctx.send(request).await?))
}
