//! WooCommerce store tools.
//!
//! Thin lookups over `wp-json/wc/v3`, authenticated with the consumer
//! key/secret. List tools trim each item to the fields an assistant needs.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::common::{
    ToolReply, clamp_per_page, default_page, default_per_page, fetch_list, id_string,
    opt_id_string, path_segment, pick_all,
};
use crate::domains::tools::{ToolContext, ToolResult, ToolSpec};
use crate::domains::upstream::{AuthMode, Backend, UpstreamRequest};

const PRODUCT_FIELDS: &[&str] = &["id", "name", "sku", "price", "stock_quantity", "total_sales"];
const CUSTOMER_FIELDS: &[&str] = &["id", "email", "first_name", "last_name", "username", "date_created"];
const COUPON_FIELDS: &[&str] = &[
    "id",
    "code",
    "amount",
    "discount_type",
    "date_expires",
    "usage_count",
    "usage_limit",
];
const REVIEW_FIELDS: &[&str] = &[
    "id",
    "product_id",
    "reviewer",
    "rating",
    "review",
    "verified",
    "date_created",
];

pub fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "get_products",
            "List WooCommerce products with id, name, SKU, price, stock and total sales.",
            get_products,
        ),
        ToolSpec::new(
            "get_product",
            "Get the full record of a single WooCommerce product.",
            get_product,
        ),
        ToolSpec::new(
            "get_orders",
            "List WooCommerce orders, optionally filtered by status, date range or customer.",
            get_orders,
        ),
        ToolSpec::new(
            "get_order",
            "Get the full record of a single WooCommerce order.",
            get_order,
        ),
        ToolSpec::new("get_customers", "List WooCommerce customers.", get_customers),
        ToolSpec::new("get_coupons", "List WooCommerce coupons.", get_coupons),
        ToolSpec::new(
            "get_product_reviews",
            "List product reviews, optionally for a single product.",
            get_product_reviews,
        ),
        ToolSpec::new(
            "get_sales_report",
            "Get the WooCommerce sales report for a period or date range.",
            get_sales_report,
        ),
        ToolSpec::new(
            "get_top_sellers",
            "Get the best-selling products for a period or date range.",
            get_top_sellers,
        ),
        ToolSpec::new(
            "update_order_status",
            "Change the status of an order.",
            update_order_status,
        )
        .hidden(),
        ToolSpec::new(
            "update_product_stock",
            "Set the stock quantity of a product.",
            update_product_stock,
        )
        .hidden(),
    ]
}

fn store_get(path: impl Into<String>) -> UpstreamRequest {
    UpstreamRequest::get(Backend::Store, path).auth(AuthMode::Basic)
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductsParams {
    #[schemars(description = "Number of products to return (default: 10, max: 100)")]
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[schemars(description = "Page number (default: 1)")]
    #[serde(default = "default_page")]
    pub page: u32,

    #[schemars(description = "Category ID to filter by", with = "Option<String>")]
    #[serde(default, deserialize_with = "opt_id_string")]
    pub category: Option<String>,

    #[schemars(description = "Search term")]
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductIdParams {
    #[schemars(description = "WooCommerce product ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub product_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OrdersParams {
    #[schemars(description = "Number of orders to return (default: 10, max: 100)")]
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[schemars(description = "Order status: any, pending, processing, on-hold, completed, cancelled, refunded, failed")]
    #[serde(default = "default_status")]
    pub status: String,

    #[schemars(description = "Only orders created after this ISO 8601 date")]
    #[serde(default)]
    pub after: Option<String>,

    #[schemars(description = "Only orders created before this ISO 8601 date")]
    #[serde(default)]
    pub before: Option<String>,

    #[schemars(description = "Customer ID to filter by", with = "Option<String>")]
    #[serde(default, deserialize_with = "opt_id_string")]
    pub customer: Option<String>,
}

fn default_status() -> String {
    "any".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OrderIdParams {
    #[schemars(description = "WooCommerce order ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub order_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CustomersParams {
    #[schemars(description = "Number of customers to return (default: 10, max: 100)")]
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[schemars(description = "Search by name or email")]
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CouponsParams {
    #[schemars(description = "Number of coupons to return (default: 10, max: 100)")]
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[schemars(description = "Exact coupon code")]
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReviewsParams {
    #[schemars(description = "Only reviews of this product ID", with = "Option<String>")]
    #[serde(default, deserialize_with = "opt_id_string")]
    pub product_id: Option<String>,

    #[schemars(description = "Number of reviews to return (default: 10, max: 100)")]
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Shared by the report tools.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportParams {
    #[schemars(description = "Report period: week, month, last_month or year")]
    #[serde(default)]
    pub period: Option<String>,

    #[schemars(description = "Start date (YYYY-MM-DD)")]
    #[serde(default)]
    pub date_min: Option<String>,

    #[schemars(description = "End date (YYYY-MM-DD)")]
    #[serde(default)]
    pub date_max: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OrderStatusParams {
    #[schemars(description = "WooCommerce order ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub order_id: String,

    #[schemars(description = "New order status")]
    pub status: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StockParams {
    #[schemars(description = "WooCommerce product ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub product_id: String,

    #[schemars(description = "New stock quantity")]
    pub stock_quantity: i64,
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_products(ctx: ToolContext, params: ProductsParams) -> ToolResult<ToolReply> {
    let request = store_get("products")
        .query("per_page", clamp_per_page(params.per_page))
        .query("page", params.page.max(1))
        .query_opt("category", params.category)
        .query_opt("search", params.search);

    let products = fetch_list(&ctx, request).await?;
    ToolReply::json(pick_all(&products, PRODUCT_FIELDS))
}

async fn get_product(ctx: ToolContext, params: ProductIdParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.product_id)?;
    Ok(ToolReply::Json(ctx.send(store_get(format!("products/{id}"))).await?))
}

/// Order summary: the line item list is reduced to its length.
fn order_summary(order: &Value) -> Value {
    json!({
        "id": order.get("id"),
        "status": order.get("status"),
        "total": order.get("total"),
        "date_created": order.get("date_created"),
        "customer_id": order.get("customer_id"),
        "line_items": order
            .get("line_items")
            .and_then(Value::as_array)
            .map_or(0, Vec::len),
    })
}

async fn get_orders(ctx: ToolContext, params: OrdersParams) -> ToolResult<ToolReply> {
    let request = store_get("orders")
        .query("per_page", clamp_per_page(params.per_page))
        .query("status", params.status)
        .query_opt("after", params.after)
        .query_opt("before", params.before)
        .query_opt("customer", params.customer);

    let orders = fetch_list(&ctx, request).await?;
    ToolReply::json(orders.iter().map(order_summary).collect::<Vec<_>>())
}

async fn get_order(ctx: ToolContext, params: OrderIdParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.order_id)?;
    Ok(ToolReply::Json(ctx.send(store_get(format!("orders/{id}"))).await?))
}

async fn get_customers(ctx: ToolContext, params: CustomersParams) -> ToolResult<ToolReply> {
    let request = store_get("customers")
        .query("per_page", clamp_per_page(params.per_page))
        .query_opt("search", params.search);

    let customers = fetch_list(&ctx, request).await?;
    ToolReply::json(pick_all(&customers, CUSTOMER_FIELDS))
}

async fn get_coupons(ctx: ToolContext, params: CouponsParams) -> ToolResult<ToolReply> {
    let request = store_get("coupons")
        .query("per_page", clamp_per_page(params.per_page))
        .query_opt("code", params.code);

    let coupons = fetch_list(&ctx, request).await?;
    ToolReply::json(pick_all(&coupons, COUPON_FIELDS))
}

async fn get_product_reviews(ctx: ToolContext, params: ReviewsParams) -> ToolResult<ToolReply> {
    let request = store_get("products/reviews")
        .query("per_page", clamp_per_page(params.per_page))
        .query_opt("product", params.product_id);

    let reviews = fetch_list(&ctx, request).await?;
    ToolReply::json(pick_all(&reviews, REVIEW_FIELDS))
}

fn report(path: &str, params: ReportParams) -> UpstreamRequest {
    store_get(path)
        .query_opt("period", params.period)
        .query_opt("date_min", params.date_min)
        .query_opt("date_max", params.date_max)
}

async fn get_sales_report(ctx: ToolContext, params: ReportParams) -> ToolResult<ToolReply> {
    Ok(ToolReply::Json(ctx.send(report("reports/sales", params)).await?))
}

async fn get_top_sellers(ctx: ToolContext, params: ReportParams) -> ToolResult<ToolReply> {
    Ok(ToolReply::Json(ctx.send(report("reports/top_sellers", params)).await?))
}

async fn update_order_status(ctx: ToolContext, params: OrderStatusParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.order_id)?;
    let request = UpstreamRequest::put(Backend::Store, format!("orders/{id}"))
        .auth(AuthMode::Basic)
        .json(json!({ "status": params.status }));
    Ok(ToolReply::Json(ctx.send(request).await?))
}

async fn update_product_stock(ctx: ToolContext, params: StockParams) -> ToolResult<ToolReply> {
    let id = path_segment(&params.product_id)?;
    let request = UpstreamRequest::put(Backend::Store, format!("products/{id}"))
        .auth(AuthMode::Basic)
        .json(json!({
            "manage_stock": true,
            "stock_quantity": params.stock_quantity,
        }));
    Ok(ToolReply::Json(ctx.send(request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::{call, call_json, text_of};
    use crate::domains::upstream::UpstreamError;
    use crate::domains::upstream::mock::MockUpstream;
    use reqwest::Method;

    #[tokio::test]
    async fn test_get_products_shapes_and_clamps() {
        let upstream = MockUpstream::returning(json!([
            { "id": 1, "name": "Banner", "sku": "B-1", "price": "12.00",
              "stock_quantity": 4, "total_sales": 9, "description": "<p>long</p>" }
        ]));

        let products = call_json(
            &upstream,
            "get_products",
            json!({ "per_page": 500, "category": 15, "search": "banner" }),
        )
        .await;

        assert_eq!(
            products,
            json!([{ "id": 1, "name": "Banner", "sku": "B-1", "price": "12.00",
                     "stock_quantity": 4, "total_sales": 9 }])
        );

        let request = &upstream.calls()[0];
        assert_eq!(request.backend, Backend::Store);
        assert_eq!(request.path, "products");
        assert_eq!(request.auth, AuthMode::Basic);
        assert_eq!(request.query_value("per_page"), Some("100"));
        assert_eq!(request.query_value("page"), Some("1"));
        assert_eq!(request.query_value("category"), Some("15"));
        assert_eq!(request.query_value("search"), Some("banner"));
    }

    #[tokio::test]
    async fn test_get_orders_defaults() {
        let upstream = MockUpstream::returning(json!([
            { "id": 7, "status": "completed", "total": "30.00",
              "date_created": "2024-03-02T10:00:00", "customer_id": 3,
              "line_items": [{}, {}] }
        ]));

        let orders = call_json(&upstream, "get_orders", json!({})).await;
        assert_eq!(orders[0]["line_items"], json!(2));
        assert_eq!(orders[0]["customer_id"], json!(3));

        let request = &upstream.calls()[0];
        assert_eq!(request.query_value("per_page"), Some("10"));
        assert_eq!(request.query_value("status"), Some("any"));
        assert_eq!(request.query_value("after"), None);
    }

    #[tokio::test]
    async fn test_get_order_accepts_numeric_id() {
        let upstream = MockUpstream::returning(json!({ "id": 55, "status": "processing" }));
        let order = call_json(&upstream, "get_order", json!({ "order_id": 55 })).await;

        assert_eq!(order["status"], "processing");
        assert_eq!(upstream.calls()[0].path, "orders/55");
    }

    #[tokio::test]
    async fn test_rejects_path_escaping_ids() {
        let upstream = MockUpstream::returning(json!({}));
        let result = call(&upstream, "get_product", json!({ "product_id": "1/../../users" })).await;

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error: Invalid arguments:"));
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_message() {
        let upstream = MockUpstream::new(|_| Err(UpstreamError::new("Invalid ID.")));
        let result = call(&upstream, "get_order", json!({ "order_id": "999" })).await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Error: Invalid ID.");
    }

    #[tokio::test]
    async fn test_hidden_updates_send_put_bodies() {
        let upstream = MockUpstream::returning(json!({ "id": 5 }));

        call_json(
            &upstream,
            "update_order_status",
            json!({ "order_id": "5", "status": "completed" }),
        )
        .await;
        call_json(
            &upstream,
            "update_product_stock",
            json!({ "product_id": 8, "stock_quantity": 0 }),
        )
        .await;

        let calls = upstream.calls();
        assert_eq!(calls[0].method, Method::PUT);
        assert_eq!(calls[0].path, "orders/5");
        assert_eq!(calls[0].body, Some(json!({ "status": "completed" })));
        assert_eq!(calls[1].path, "products/8");
        assert_eq!(
            calls[1].body,
            Some(json!({ "manage_stock": true, "stock_quantity": 0 }))
        );
    }

    #[tokio::test]
    async fn test_reports_pass_filters() {
        let upstream = MockUpstream::returning(json!([{ "total_sales": "100.00" }]));
        call_json(&upstream, "get_sales_report", json!({ "period": "month" })).await;
        call_json(
            &upstream,
            "get_top_sellers",
            json!({ "date_min": "2024-01-01", "date_max": "2024-01-31" }),
        )
        .await;

        let calls = upstream.calls();
        assert_eq!(calls[0].path, "reports/sales");
        assert_eq!(calls[0].query_value("period"), Some("month"));
        assert_eq!(calls[1].path, "reports/top_sellers");
        assert_eq!(calls[1].query_value("date_max"), Some("2024-01-31"));
    }
}
