//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - `ToolSpec`: one tool's descriptor plus its type-erased handler
//! - `ToolRegistry`: the name → spec table used for listing and dispatch
//!
//! Dispatch is a map lookup, so every registered name has exactly one
//! handler and no branch can become unreachable as the tool set grows.

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::context::ToolContext;
use super::definitions;
use super::definitions::common::ToolReply;
use super::error::{ToolError, ToolResult};

type Handler = Arc<dyn Fn(ToolContext, JsonObject) -> BoxFuture<'static, ToolResult<ToolReply>> + Send + Sync>;

/// Whether a tool shows up in `tools/list`.
///
/// Hidden tools stay callable by name. This is not an access control
/// mechanism: the transport API key is the only gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Listed,
    Hidden,
}

/// A registered tool.
#[derive(Clone)]
pub struct ToolSpec {
    tool: Tool,
    visibility: Visibility,
    required: Vec<String>,
    handler: Handler,
}

impl ToolSpec {
    /// Build a spec whose input schema is derived from `P`.
    ///
    /// The handler only runs once every argument listed as required by the
    /// schema is present and non-blank, and the arguments deserialize into `P`.
    pub fn new<P, F, Fut>(
        name: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
        run: F,
    ) -> Self
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(ToolContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<ToolReply>> + Send + 'static,
    {
        let input_schema = schema_for_type::<P>();
        let required = required_arguments(&input_schema);

        let handler: Handler = Arc::new(move |ctx: ToolContext, args: JsonObject| {
            match serde_json::from_value::<P>(Value::Object(args)) {
                Ok(params) => run(ctx, params).boxed(),
                Err(e) => futures::future::ready(Err(ToolError::invalid_arguments(e.to_string())))
                    .boxed(),
            }
        });

        Self {
            tool: Tool {
                name: name.into(),
                description: Some(description.into()),
                input_schema: Arc::new(input_schema),
                annotations: None,
                output_schema: None,
                icons: None,
                meta: None,
                title: None,
            },
            visibility: Visibility::Listed,
            required,
            handler,
        }
    }

    /// Keep the tool dispatchable but out of `tools/list`.
    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    pub fn name(&self) -> &str {
        &self.tool.name
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Names of required arguments, as advertised in the input schema.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    fn missing_arguments(&self, args: &JsonObject) -> Vec<String> {
        self.required
            .iter()
            .filter(|name| match args.get(name.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .cloned()
            .collect()
    }
}

fn required_arguments(schema: &JsonObject) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - the immutable name → handler table.
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create the registry with every tool this server provides.
    pub fn new() -> Self {
        Self::from_specs(definitions::all())
    }

    /// Create a registry from an explicit list; later duplicates are dropped.
    pub fn from_specs(specs: Vec<ToolSpec>) -> Self {
        let mut kept = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());

        for spec in specs {
            if index.contains_key(spec.name()) {
                warn!("Duplicate tool name ignored: {}", spec.name());
                continue;
            }
            index.insert(spec.name().to_string(), kept.len());
            kept.push(spec);
        }

        Self { specs: kept, index }
    }

    /// Descriptors advertised to clients, in registration order.
    pub fn descriptors(&self) -> Vec<Tool> {
        self.specs
            .iter()
            .filter(|spec| spec.visibility == Visibility::Listed)
            .map(|spec| spec.tool.clone())
            .collect()
    }

    /// Every dispatchable tool name, hidden ones included.
    pub fn tool_names(&self) -> Vec<&str> {
        self.specs.iter().map(ToolSpec::name).collect()
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    /// Dispatch a tool call.
    ///
    /// Always produces a result with a single text block; failures are
    /// error-flagged results, never protocol faults.
    #[instrument(skip(self, ctx, arguments))]
    pub async fn call(
        &self,
        ctx: &ToolContext,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> CallToolResult {
        let Some(spec) = self.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return CallToolResult::error(vec![Content::text(format!("Unknown tool: {name}"))]);
        };

        info!("Calling tool: {}", name);

        let args = arguments.unwrap_or_default();
        let missing = spec.missing_arguments(&args);
        let outcome = if missing.is_empty() {
            (spec.handler)(ctx.clone(), args).await
        } else {
            Err(ToolError::MissingArguments(missing))
        };

        match outcome {
            Ok(reply) => reply.into_call_result(),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                CallToolResult::error(vec![Content::text(format!("Error: {e}"))])
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::{object, text_of};
    use crate::domains::upstream::mock::MockUpstream;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct EchoParams {
        word: String,
        #[serde(default)]
        times: u32,
    }

    async fn echo(_ctx: ToolContext, params: EchoParams) -> ToolResult<ToolReply> {
        Ok(ToolReply::text(params.word.repeat(params.times.max(1) as usize)))
    }

    #[tokio::test]
    async fn test_required_and_invalid_arguments() {
        let registry = ToolRegistry::from_specs(vec![ToolSpec::new("echo", "Echo", echo)]);
        let ctx = ToolContext::new(MockUpstream::returning(json!([])));
        assert_eq!(registry.get("echo").unwrap().required(), ["word".to_string()]);

        let result = registry.call(&ctx, "echo", object(json!({ "word": "  " }))).await;
        assert_eq!(text_of(&result), "Error: word is required");
        assert_eq!(result.is_error, Some(true));

        let result = registry
            .call(&ctx, "echo", object(json!({ "word": "a", "times": "x" })))
            .await;
        assert!(text_of(&result).starts_with("Error: Invalid arguments:"));

        let result = registry
            .call(&ctx, "echo", object(json!({ "word": "ab", "times": 2 })))
            .await;
        assert_eq!(text_of(&result), "abab");
    }

    #[tokio::test]
    async fn test_duplicates_and_hidden() {
        let registry = ToolRegistry::from_specs(vec![
            ToolSpec::new("echo", "Echo", echo),
            ToolSpec::new("echo", "Second echo", echo),
            ToolSpec::new("secret_echo", "Echo", echo).hidden(),
        ]);
        assert_eq!(registry.tool_names(), vec!["echo", "secret_echo"]);

        let listed: Vec<_> = registry.descriptors().into_iter().map(|t| t.name).collect();
        assert_eq!(listed, vec!["echo"]);

        let ctx = ToolContext::new(MockUpstream::returning(json!([])));
        let result = registry
            .call(&ctx, "secret_echo", object(json!({ "word": "hi" })))
            .await;
        assert_eq!(text_of(&result), "hi");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let upstream = MockUpstream::returning(json!([]));
        let ctx = ToolContext::new(upstream.clone());

        let result = registry.call(&ctx, "launch_rockets", None).await;
        assert_eq!(text_of(&result), "Unknown tool: launch_rockets");
        assert_eq!(upstream.call_count(), 0);
    }

    #[test]
    fn test_registry_names_unique() {
        let specs = definitions::all();
        let total = specs.len();
        let registry = ToolRegistry::from_specs(specs);
        assert_eq!(registry.tool_names().len(), total);
    }

    #[test]
    fn test_hidden_admin_tools() {
        let registry = ToolRegistry::new();
        let listed: Vec<String> = registry
            .descriptors()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();

        for hidden in ["update_order_status", "update_product_stock", "delete_quote"] {
            assert!(registry.get(hidden).is_some(), "{hidden} must be dispatchable");
            assert!(!listed.contains(&hidden.to_string()), "{hidden} must not be listed");
        }
        assert_eq!(listed.len() + 3, registry.tool_names().len());
    }

    /// Fill every required argument with a placeholder the tool accepts.
    fn minimal_arguments(spec: &ToolSpec) -> JsonObject {
        let properties = spec
            .tool()
            .input_schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        spec.required()
            .iter()
            .map(|name| {
                let kind = properties
                    .get(name)
                    .and_then(|p| p.get("type"))
                    .cloned()
                    .unwrap_or(Value::Null);
                let value = match kind.as_str() {
                    Some("integer") | Some("number") => json!(1),
                    Some("boolean") => json!(true),
                    _ => json!("1"),
                };
                (name.clone(), value)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_every_tool_answers_with_minimal_arguments() {
        let registry = ToolRegistry::new();
        let upstream = MockUpstream::returning(json!([]));
        let ctx = ToolContext::new(upstream.clone());

        for spec in registry.specs() {
            let args = minimal_arguments(spec);
            let result = registry.call(&ctx, spec.name(), Some(args)).await;
            let text = text_of(&result);

            assert_ne!(result.is_error, Some(true), "{}: {}", spec.name(), text);
            let is_json = serde_json::from_str::<Value>(&text).is_ok();
            let is_status = !text.is_empty() && !text.starts_with("Error");
            assert!(is_json || is_status, "{}: {}", spec.name(), text);
        }
        assert!(upstream.call_count() > 0);
    }

    #[tokio::test]
    async fn test_missing_required_arguments_never_reach_upstream() {
        let registry = ToolRegistry::new();
        let upstream = MockUpstream::returning(json!([]));
        let ctx = ToolContext::new(upstream.clone());

        let mut checked = 0;
        for spec in registry.specs().iter().filter(|s| !s.required().is_empty()) {
            let result = registry.call(&ctx, spec.name(), None).await;
            let text = text_of(&result);
            assert!(text.starts_with("Error: "), "{}: {}", spec.name(), text);
            assert!(text.contains("required"), "{}: {}", spec.name(), text);
            checked += 1;
        }

        assert!(checked > 20);
        assert_eq!(upstream.call_count(), 0);
    }
}
