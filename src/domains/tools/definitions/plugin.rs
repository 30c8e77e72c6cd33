//! Tools backed by the store's custom plugin namespace.
//!
//! Protection differs per endpoint: business info is public, the profile,
//! pricing and production endpoints want the plugin API key, and mockup
//! creation runs as the WordPress admin user.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::common::{NoParams, ToolReply, id_string, path_segment};
use crate::domains::tools::{ToolContext, ToolResult, ToolSpec};
use crate::domains::upstream::{AuthMode, Backend, UpstreamRequest};

pub fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "get_business_info",
            "Get public business information: name, contact details and opening hours.",
            get_business_info,
        ),
        ToolSpec::new(
            "get_business_profile",
            "Get the internal business profile.",
            get_business_profile,
        ),
        ToolSpec::new(
            "get_product_pricing",
            "Get tiered B2B pricing for a product, optionally for a given quantity.",
            get_product_pricing,
        ),
        ToolSpec::new(
            "get_production_status",
            "Get the production status of an order.",
            get_production_status,
        ),
        ToolSpec::new(
            "create_mockup",
            "Request a product mockup from a design file URL.",
            create_mockup,
        ),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PricingParams {
    #[schemars(description = "WooCommerce product ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub product_id: String,

    #[schemars(description = "Quantity to price")]
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductionParams {
    #[schemars(description = "WooCommerce order ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub order_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MockupParams {
    #[schemars(description = "WooCommerce product ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub product_id: String,

    #[schemars(description = "Public URL of the design file")]
    pub design_url: String,

    #[schemars(description = "Notes for the designer")]
    #[serde(default)]
    pub notes: Option<String>,
}

async fn get_business_info(ctx: ToolContext, _params: NoParams) -> ToolResult<ToolReply> {
    let request = UpstreamRequest::get(Backend::Plugin, "business-info");
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_business_profile(ctx: ToolContext, _params: NoParams) -> ToolResult<ToolReply> {
    let request = UpstreamRequest::get(Backend::Plugin, "business-profile").auth(AuthMode::ApiKey);
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_product_pricing(ctx: ToolContext, params: PricingParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.product_id)?;
    let request = UpstreamRequest::get(Backend::Plugin, format!("products/{id}/pricing"))
        .query_opt("quantity", params.quantity)
        .auth(AuthMode::ApiKey);
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_production_status(ctx: ToolContext, params: ProductionParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.order_id)?;
    let request = UpstreamRequest::get(Backend::Plugin, format!("orders/{id}/production-status"))
        .auth(AuthMode::ApiKey);
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn create_mockup(ctx: ToolContext, params: MockupParams) -> ToolResult<ToolReply> {
    let mut body = json!({
        "product_id": params.product_id,
        "design_url": params.design_url,
    });
    if let Some(notes) = params.notes {
        body["notes"] = json!(notes);
    }

    let request = UpstreamRequest::post(Backend::Plugin, "mockups")
        .auth(AuthMode::Basic)
        .json(body);
    Ok(ToolReply::Json(ctx.send(request).await?))
}
