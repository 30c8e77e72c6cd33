//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tool registry.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/`, one file per backend.
//! Both the rmcp `ServerHandler` (STDIO) and the SSE transport list and
//! dispatch through the same [`ToolRegistry`], so
//! **adding a new tool does NOT require modifying this file!**

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, JsonObject, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::{ToolContext, ToolRegistry};

/// The main MCP server handler.
///
/// Cheap to clone: configuration and the registry are shared behind `Arc`s
/// and the tool context only holds an `Arc` to the upstream client.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Name → handler table for every tool.
    registry: Arc<ToolRegistry>,

    /// Context handed to each tool invocation.
    context: ToolContext,
}

impl McpServer {
    /// Create a new MCP server with the given configuration and tool context.
    pub fn new(config: Config, context: ToolContext) -> Self {
        let registry = ToolRegistry::new();
        info!(
            "Registered {} tools ({} listed)",
            registry.tool_names().len(),
            registry.descriptors().len()
        );

        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            context,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch a tool call; always yields a result, never a protocol fault.
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        self.registry.call(&self.context, name, arguments).await
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// Tool descriptors as JSON-RPC `tools/list` entries.
    pub fn list_tools_json(&self) -> Vec<Value> {
        self.registry
            .descriptors()
            .into_iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool and render the result as a JSON-RPC `tools/call` result.
    pub async fn call_tool_json(&self, name: &str, arguments: Option<JsonObject>) -> Value {
        let result = self.call(name, arguments).await;
        serde_json::to_value(&result).unwrap_or_else(|e| {
            json!({
                "content": [{ "type": "text", "text": format!("Error: {e}") }],
                "isError": true
            })
        })
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Commerce operations server: WooCommerce store data and analytics, \
                 B2B plugin endpoints, quotes, Zendesk tickets and Zendesk Sell CRM records."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.registry.descriptors(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call(&request.name, request.arguments).await)
    }
}
