//! Zendesk Sell tools.
//!
//! Besides lead/contact/deal lookups, a family of field tools reads one
//! named attribute of a contact. They are generated from [`CONTACT_FIELDS`]:
//! the standard attribute wins when it holds a value, otherwise the custom
//! field of the same name is reported.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{ToolReply, id_string, opt_id_string, path_segment};
use crate::domains::tools::{ToolContext, ToolResult, ToolSpec};
use crate::domains::upstream::{AuthMode, Backend, UpstreamRequest};

/// Tool name suffix → Sell field name.
pub const CONTACT_FIELDS: &[(&str, &str)] = &[
    ("industry", "industry"),
    ("client", "Client"),
    ("equipment", "Equipment"),
    ("sample_box", "Sample Box"),
    ("product", "Product"),
    ("service", "Service"),
    ("nova_web_id", "NOVA Web ID"),
    ("journey_of_acquisition", "Journey of Acquisition"),
    ("completed_web_training", "Completed Web Training"),
    ("current_suppliers", "Current Suppliers"),
];

pub fn tools() -> Vec<ToolSpec> {
    let mut tools = vec![
        ToolSpec::new("search_zendesk_sell_leads", "Search for leads in Zendesk Sell.", search_leads),
        ToolSpec::new(
            "get_zendesk_sell_lead",
            "Get details of a specific Zendesk Sell lead by ID.",
            get_lead,
        ),
        ToolSpec::new(
            "search_zendesk_sell_contacts",
            "Search for contacts in Zendesk Sell.",
            search_contacts,
        ),
        ToolSpec::new(
            "get_zendesk_sell_contact",
            "Get details of a specific Zendesk Sell contact by ID.",
            get_contact,
        ),
        ToolSpec::new("search_zendesk_sell_deals", "Search for deals in Zendesk Sell.", search_deals),
        ToolSpec::new(
            "get_zendesk_sell_deal",
            "Get details of a specific Zendesk Sell deal by ID.",
            get_deal,
        ),
    ];

    tools.extend(CONTACT_FIELDS.iter().map(|&(suffix, field)| {
        ToolSpec::new(
            format!("get_zendesk_sell_contact_{suffix}"),
            format!("Fetch the '{field}' field value for a specific Zendesk Sell contact."),
            move |ctx: ToolContext, params: ContactParams| contact_field(ctx, params, field),
        )
    }));

    tools
}

fn sell_get(path: impl Into<String>) -> UpstreamRequest {
    UpstreamRequest::get(Backend::Crm, path).auth(AuthMode::Bearer)
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LeadSearchParams {
    #[schemars(description = "Filter by email")]
    #[serde(default)]
    pub email: Option<String>,
    #[schemars(description = "Filter by first name")]
    #[serde(default)]
    pub first_name: Option<String>,
    #[schemars(description = "Filter by last name")]
    #[serde(default)]
    pub last_name: Option<String>,
    #[schemars(description = "Filter by organization name")]
    #[serde(default)]
    pub organization_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LeadParams {
    #[schemars(description = "The Zendesk Sell lead ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub lead_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContactSearchParams {
    #[schemars(description = "Filter by email")]
    #[serde(default)]
    pub email: Option<String>,
    #[schemars(description = "Filter by name")]
    #[serde(default)]
    pub name: Option<String>,
    #[schemars(description = "Filter by whether the contact is an organization")]
    #[serde(default)]
    pub is_organization: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContactParams {
    #[schemars(description = "The Zendesk Sell contact ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub contact_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DealSearchParams {
    #[schemars(description = "Filter by deal name")]
    #[serde(default)]
    pub name: Option<String>,
    #[schemars(description = "Filter by contact ID", with = "Option<String>")]
    #[serde(default, deserialize_with = "opt_id_string")]
    pub contact_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DealParams {
    #[schemars(description = "The Zendesk Sell deal ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub deal_id: String,
}

#[derive(Debug, Serialize)]
struct FieldValue {
    contact_id: String,
    field: &'static str,
    value: Value,
}

// ============================================================================
// Handlers
// ============================================================================

async fn search_leads(ctx: ToolContext, params: LeadSearchParams) -> ToolResult<ToolReply> {
    let request = sell_get("leads")
        .query_opt("email", params.email)
        .query_opt("first_name", params.first_name)
        .query_opt("last_name", params.last_name)
        .query_opt("organization_name", params.organization_name);
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_lead(ctx: ToolContext, params: LeadParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.lead_id)?;
    Ok(ToolReply::Json(ctx.send(sell_get(format!("leads/{id}"))).await?))
}

async fn search_contacts(ctx: ToolContext, params: ContactSearchParams) -> ToolResult<ToolReply> {
    let request = sell_get("contacts")
        .query_opt("email", params.email)
        .query_opt("name", params.name)
        .query_opt("is_organization", params.is_organization);
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_contact(ctx: ToolContext, params: ContactParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.contact_id)?;
    Ok(ToolReply::Json(ctx.send(sell_get(format!("contacts/{id}"))).await?))
}

async fn search_deals(ctx: ToolContext, params: DealSearchParams) -> ToolResult<ToolReply> {
    let request = sell_get("deals")
        .query_opt("name", params.name)
        .query_opt("contact_id", params.contact_id);
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn get_deal(ctx: ToolContext, params: DealParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.deal_id)?;
    Ok(ToolReply::Json(ctx.send(sell_get(format!("deals/{id}"))).await?))
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Standard attribute when set, otherwise the custom field of that name.
pub fn contact_field_value(contact: &Value, field: &str) -> Value {
    let data = contact.get("data");
    let standard = data.and_then(|d| d.get(field)).filter(|v| has_value(v));
    let custom = || {
        data.and_then(|d| d.get("custom_fields"))
            .and_then(|c| c.get(field))
    };

    standard.or_else(custom).cloned().unwrap_or(Value::Null)
}

async fn contact_field(
    ctx: ToolContext,
    params: ContactParams,
    field: &'static str,
) -> ToolResult<ToolReply> {
    let id = path_segment(&params.contact_id)?;
    let contact = ctx.send(sell_get(format!("contacts/{id}"))).await?;

    ToolReply::json(FieldValue {
        value: contact_field_value(&contact, field),
        contact_id: params.contact_id,
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ToolRegistry;
    use crate::domains::tools::testing::{call, call_json, text_of};
    use crate::domains::upstream::UpstreamError;
    use crate::domains::upstream::mock::MockUpstream;
    use serde_json::json;

    #[test]
    fn test_field_tools_registered() {
        let registry = ToolRegistry::new();
        for (suffix, _) in CONTACT_FIELDS {
            let name = format!("get_zendesk_sell_contact_{suffix}");
            let spec = registry.get(&name).unwrap_or_else(|| panic!("{name} missing"));
            assert_eq!(spec.required(), ["contact_id".to_string()]);
        }
    }

    #[test]
    fn test_standard_field_wins_when_set() {
        let contact = json!({ "data": {
            "industry": "Retail",
            "custom_fields": { "industry": "Ignored", "Client": "Yes", "Product": "Vinyl" },
            "Product": "",
        }});

        assert_eq!(contact_field_value(&contact, "industry"), json!("Retail"));
        assert_eq!(contact_field_value(&contact, "Client"), json!("Yes"));
        assert_eq!(contact_field_value(&contact, "Product"), json!("Vinyl"));
        assert_eq!(contact_field_value(&contact, "Service"), Value::Null);
        assert_eq!(contact_field_value(&json!({}), "Service"), Value::Null);
    }

    #[tokio::test]
    async fn test_field_tool_reply() {
        let upstream = MockUpstream::returning(json!({ "data": {
            "id": 77,
            "custom_fields": { "Sample Box": "Sent 2024-02" },
        }}));

        let reply = call_json(
            &upstream,
            "get_zendesk_sell_contact_sample_box",
            json!({ "contact_id": 77 }),
        )
        .await;
        assert_eq!(
            reply,
            json!({ "contact_id": "77", "field": "Sample Box", "value": "Sent 2024-02" })
        );

        let request = &upstream.calls()[0];
        assert_eq!(request.backend, Backend::Crm);
        assert_eq!(request.path, "contacts/77");
        assert_eq!(request.auth, AuthMode::Bearer);
    }

    #[tokio::test]
    async fn test_search_sends_only_given_filters() {
        let upstream = MockUpstream::returning(json!({ "items": [] }));
        call_json(
            &upstream,
            "search_zendesk_sell_contacts",
            json!({ "email": "ann@example.com", "name": null, "is_organization": false }),
        )
        .await;
        call_json(&upstream, "search_zendesk_sell_deals", json!({ "contact_id": 9 })).await;

        let calls = upstream.calls();
        assert_eq!(
            calls[0].query,
            vec![
                ("email".to_string(), "ann@example.com".to_string()),
                ("is_organization".to_string(), "false".to_string()),
            ]
        );
        assert_eq!(calls[1].path, "deals");
        assert_eq!(calls[1].query, vec![("contact_id".to_string(), "9".to_string())]);
    }

    #[tokio::test]
    async fn test_lookup_paths() {
        let upstream = MockUpstream::returning(json!({ "data": {} }));
        call_json(&upstream, "get_zendesk_sell_lead", json!({ "lead_id": 1 })).await;
        call_json(&upstream, "get_zendesk_sell_contact", json!({ "contact_id": 2 })).await;
        call_json(&upstream, "get_zendesk_sell_deal", json!({ "deal_id": 3 })).await;

        let paths: Vec<_> = upstream.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec!["leads/1", "contacts/2", "deals/3"]);
    }

    #[tokio::test]
    async fn test_field_tool_error_skips_extraction() {
        let upstream = MockUpstream::new(|_| Err(UpstreamError::new("[{\"error\":{\"code\":\"not_found\"}}]")));
        let result = call(
            &upstream,
            "get_zendesk_sell_contact_industry",
            json!({ "contact_id": "404" }),
        )
        .await;

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error: [{"));
    }
}
