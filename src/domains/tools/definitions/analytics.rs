//! Store analytics tools.
//!
//! Each tool fetches from the store first and aggregates afterwards with
//! the pure helpers in `tools::aggregate`; an upstream failure ends the
//! call before any aggregation runs.

use chrono::{Duration, Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::common::{NoParams, PAGE_SIZE, ToolReply, fetch_list, id_string, paginate};
use crate::domains::tools::aggregate::{
    self, CategoryRevenue, compare_periods as compare, frequent_buyers, lifetime_value,
    low_stock, rank_categories, sales_trends, summarize_period,
};
use crate::domains::tools::{ToolContext, ToolError, ToolResult, ToolSpec};
use crate::domains::upstream::{AuthMode, Backend, UpstreamRequest};

/// Timestamp layout the store expects for `after`/`before`.
const STORE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S";

pub fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "analyze_sales_trends",
            "Analyze completed orders over the last N days: revenue, averages and the best day.",
            analyze_sales_trends,
        ),
        ToolSpec::new(
            "get_low_stock_products",
            "Find products whose stock is at or below a threshold, lowest stock first.",
            get_low_stock_products,
        ),
        ToolSpec::new(
            "get_frequent_buyers",
            "Find registered customers with at least N completed orders.",
            get_frequent_buyers,
        ),
        ToolSpec::new(
            "get_revenue_by_category",
            "Estimate revenue per product category from total sales and current price.",
            get_revenue_by_category,
        ),
        ToolSpec::new(
            "get_customer_lifetime_value",
            "Summarize a customer's completed orders: count, total spent, average and first/last order dates.",
            get_customer_lifetime_value,
        ),
        ToolSpec::new(
            "compare_periods",
            "Compare order count and revenue between two date ranges.",
            compare_periods,
        ),
    ]
}

fn store_get(path: &str) -> UpstreamRequest {
    UpstreamRequest::get(Backend::Store, path).auth(AuthMode::Basic)
}

fn completed_orders() -> UpstreamRequest {
    store_get("orders").query("status", "completed")
}

// ============================================================================
// Sales trends
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SalesTrendsParams {
    #[schemars(description = "Number of days to look back (default: 30)")]
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    30
}

/// Reads a single page of up to 100 orders.
async fn analyze_sales_trends(ctx: ToolContext, params: SalesTrendsParams) -> ToolResult<ToolReply> {
    let end = Local::now().naive_local();
    let start = Duration::try_days(i64::from(params.days))
        .and_then(|window| end.checked_sub_signed(window))
        .ok_or_else(|| ToolError::invalid_arguments("days is out of range"))?;

    let request = completed_orders()
        .query("per_page", PAGE_SIZE)
        .query("after", start.format(STORE_TIMESTAMP))
        .query("before", end.format(STORE_TIMESTAMP));

    let orders = fetch_list(&ctx, request).await?;
    match sales_trends(&orders) {
        Some(trends) => ToolReply::json(trends),
        None => Ok(ToolReply::text("No orders found in date range")),
    }
}

// ============================================================================
// Low stock
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LowStockParams {
    #[schemars(description = "Stock level at or below which a product is reported (default: 10)")]
    #[serde(default = "default_threshold")]
    pub threshold: i64,
}

fn default_threshold() -> i64 {
    10
}

async fn get_low_stock_products(ctx: ToolContext, params: LowStockParams) -> ToolResult<ToolReply> {
    let products = paginate(&ctx, store_get("products")).await?;
    ToolReply::json(low_stock(&products, params.threshold))
}

// ============================================================================
// Frequent buyers
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FrequentBuyersParams {
    #[schemars(description = "Minimum number of completed orders (default: 2)")]
    #[serde(default = "default_min_orders")]
    pub min_orders: usize,
}

fn default_min_orders() -> usize {
    2
}

async fn get_frequent_buyers(ctx: ToolContext, params: FrequentBuyersParams) -> ToolResult<ToolReply> {
    let orders = paginate(&ctx, completed_orders()).await?;
    ToolReply::json(frequent_buyers(&orders, params.min_orders))
}

// ============================================================================
// Revenue by category
// ============================================================================

#[derive(Debug, Serialize)]
struct CategoryReport {
    total_categories: usize,
    categories: Vec<CategoryRevenue>,
}

async fn get_revenue_by_category(ctx: ToolContext, _params: NoParams) -> ToolResult<ToolReply> {
    let categories = paginate(&ctx, store_get("products/categories")).await?;

    let mut revenues = Vec::with_capacity(categories.len());
    for category in &categories {
        let Some(id) = category.get("id").filter(|id| !id.is_null()) else {
            continue;
        };
        let id = id.as_str().map_or_else(|| id.to_string(), str::to_string);
        let products = paginate(&ctx, store_get("products").query("category", &id)).await?;
        debug!("Category {} has {} products", id, products.len());
        revenues.push(aggregate::category_revenue(category, &products));
    }

    let categories = rank_categories(revenues);
    ToolReply::json(CategoryReport {
        total_categories: categories.len(),
        categories,
    })
}

// ============================================================================
// Customer lifetime value
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LifetimeValueParams {
    #[schemars(description = "WooCommerce customer ID", with = "String")]
    #[serde(deserialize_with = "id_string")]
    pub customer_id: String,
}

async fn get_customer_lifetime_value(
    ctx: ToolContext,
    params: LifetimeValueParams,
) -> ToolResult<ToolReply> {
    let request = completed_orders().query("customer", &params.customer_id);
    let orders = paginate(&ctx, request).await?;
    ToolReply::json(lifetime_value(&params.customer_id, &orders))
}

// ============================================================================
// Period comparison
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ComparePeriodsParams {
    #[schemars(description = "First period start (YYYY-MM-DD or ISO 8601)")]
    pub period1_start: String,
    #[schemars(description = "First period end (YYYY-MM-DD or ISO 8601)")]
    pub period1_end: String,
    #[schemars(description = "Second period start (YYYY-MM-DD or ISO 8601)")]
    pub period2_start: String,
    #[schemars(description = "Second period end (YYYY-MM-DD or ISO 8601)")]
    pub period2_end: String,
}

/// Widen a bare date to the start or end of that day; anything else is sent as given.
fn period_bound(value: &str, end_of_day: bool) -> String {
    let value = value.trim();
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(day) => {
            let time = if end_of_day { "23:59:59" } else { "00:00:00" };
            format!("{}T{time}", day.format("%Y-%m-%d"))
        }
        Err(_) => value.to_string(),
    }
}

async fn orders_between(ctx: &ToolContext, start: &str, end: &str) -> ToolResult<Vec<serde_json::Value>> {
    let request = completed_orders()
        .query("after", period_bound(start, false))
        .query("before", period_bound(end, true));
    paginate(ctx, request).await.map_err(ToolError::from)
}

async fn compare_periods(ctx: ToolContext, params: ComparePeriodsParams) -> ToolResult<ToolReply> {
    let first = orders_between(&ctx, &params.period1_start, &params.period1_end).await?;
    let second = orders_between(&ctx, &params.period2_start, &params.period2_end).await?;

    ToolReply::json(compare(
        summarize_period(&params.period1_start, &params.period1_end, &first),
        summarize_period(&params.period2_start, &params.period2_end, &second),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::{call, call_json, text_of};
    use crate::domains::upstream::UpstreamError;
    use crate::domains::upstream::mock::MockUpstream;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_sales_trends_query_and_result() {
        let upstream = MockUpstream::returning(json!([
            { "date_created": "2024-03-01T09:00:00", "total": "10.00", "line_items": [{}] },
            { "date_created": "2024-03-02T09:00:00", "total": "20.00", "line_items": [{}] },
            { "date_created": "2024-03-02T11:00:00", "total": "30.00", "line_items": [{}] },
        ]));

        let trends = call_json(&upstream, "analyze_sales_trends", json!({ "days": 7 })).await;
        assert_eq!(trends["total_revenue"], json!(60.0));
        assert_eq!(trends["average_order_value"], json!(20.0));
        assert_eq!(trends["best_day"]["date"], "2024-03-02");

        let request = &upstream.calls()[0];
        assert_eq!(request.path, "orders");
        assert_eq!(request.query_value("status"), Some("completed"));
        assert_eq!(request.query_value("per_page"), Some("100"));
        let after = request.query_value("after").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(after, STORE_TIMESTAMP).is_ok());
        assert_eq!(upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_sales_trends_empty_range() {
        let upstream = MockUpstream::returning(json!([]));
        let result = call(&upstream, "analyze_sales_trends", json!({})).await;

        assert_ne!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "No orders found in date range");
    }

    #[tokio::test]
    async fn test_low_stock_walks_all_pages() {
        let upstream = MockUpstream::new(|request| {
            let page = request.query_value("page").unwrap_or("1");
            let items: Vec<Value> = if page == "1" {
                (0..PAGE_SIZE as i64)
                    .map(|i| json!({ "id": i, "stock_quantity": 50 + i }))
                    .collect()
            } else {
                vec![json!({ "id": 999, "stock_quantity": 3 })]
            };
            Ok(Value::Array(items))
        });

        let report = call_json(&upstream, "get_low_stock_products", json!({ "threshold": 5 })).await;
        assert_eq!(report["total_low_stock_products"], json!(1));
        assert_eq!(report["products"][0]["id"], json!(999));
        assert_eq!(upstream.call_count(), 2);
    }

    #[tokio::test]
    async fn test_low_stock_across_three_pages() {
        let upstream = MockUpstream::new(|request| {
            let page: usize = request.query_value("page").unwrap_or("1").parse().unwrap();
            let first = (page - 1) * PAGE_SIZE;
            let items: Vec<Value> = (first..(first + PAGE_SIZE).min(250))
                .map(|i| {
                    let stock = if i % 3 == 0 { (i / 3) % 4 } else { 100 + i };
                    json!({ "id": i, "stock_quantity": stock })
                })
                .collect();
            Ok(Value::Array(items))
        });

        let report = call_json(&upstream, "get_low_stock_products", json!({ "threshold": 5 })).await;
        assert_eq!(upstream.call_count(), 3);
        assert_eq!(report["total_low_stock_products"], json!(84));

        let products = report["products"].as_array().unwrap();
        assert_eq!(products.len(), 84);
        let rows: Vec<(i64, i64)> = products
            .iter()
            .map(|p| (p["stock_quantity"].as_i64().unwrap(), p["id"].as_i64().unwrap()))
            .collect();
        assert!(rows.iter().all(|(_, id)| id % 3 == 0));
        // ascending stock, fetch order within equal stock
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(rows[0], (0, 0));
        assert_eq!(rows[83], (3, 249));
    }

    #[tokio::test]
    async fn test_sales_trends_rejects_oversized_window() {
        let upstream = MockUpstream::returning(json!([]));
        let result = call(&upstream, "analyze_sales_trends", json!({ "days": 4_000_000_000u32 })).await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Error: Invalid arguments: days is out of range");
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pagination_error_fails_the_tool() {
        let upstream = MockUpstream::new(|_| Err(UpstreamError::new("Sorry, you cannot list resources.")));
        let result = call(&upstream, "get_frequent_buyers", json!({})).await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Error: Sorry, you cannot list resources.");
    }

    #[tokio::test]
    async fn test_revenue_by_category() {
        let upstream = MockUpstream::new(|request| {
            let body = match (request.path.as_str(), request.query_value("category")) {
                ("products/categories", _) => json!([
                    { "id": 1, "name": "Signs" },
                    { "id": 2, "name": "Banners" },
                ]),
                ("products", Some("1")) => json!([{ "total_sales": 2, "price": "10" }]),
                ("products", Some("2")) => json!([{ "total_sales": 5, "price": "10" }]),
                _ => json!([]),
            };
            Ok(body)
        });

        let report = call_json(&upstream, "get_revenue_by_category", json!({})).await;
        assert_eq!(report["total_categories"], json!(2));
        assert_eq!(report["categories"][0]["name"], "Banners");
        assert_eq!(report["categories"][0]["estimated_revenue"], json!(50.0));
        assert_eq!(report["categories"][1]["estimated_revenue"], json!(20.0));
    }

    #[tokio::test]
    async fn test_customer_lifetime_value() {
        let upstream = MockUpstream::returning(json!([
            { "total": "40", "date_created": "2024-05-01T00:00:00" },
            { "total": "20", "date_created": "2024-01-01T00:00:00" },
        ]));

        let clv = call_json(&upstream, "get_customer_lifetime_value", json!({ "customer_id": 42 })).await;
        assert_eq!(clv["customer_id"], "42");
        assert_eq!(clv["total_spent"], json!(60.0));
        assert_eq!(clv["first_order_date"], "2024-01-01T00:00:00");

        let request = &upstream.calls()[0];
        assert_eq!(request.query_value("customer"), Some("42"));
        assert_eq!(request.query_value("status"), Some("completed"));
    }

    #[tokio::test]
    async fn test_compare_periods() {
        let upstream = MockUpstream::new(|request| {
            let body = if request.query_value("after") == Some("2024-02-01T00:00:00") {
                json!([{ "total": "20" }, { "total": "30" }])
            } else {
                json!([])
            };
            Ok(body)
        });

        let comparison = call_json(
            &upstream,
            "compare_periods",
            json!({
                "period1_start": "2024-01-01",
                "period1_end": "2024-01-31",
                "period2_start": "2024-02-01",
                "period2_end": "2024-02-29",
            }),
        )
        .await;

        assert_eq!(comparison["revenue_change"], json!(50.0));
        assert_eq!(comparison["revenue_change_pct"], Value::Null);
        assert_eq!(comparison["period2"]["order_count"], json!(2));

        let calls = upstream.calls();
        assert_eq!(calls[0].query_value("before"), Some("2024-01-31T23:59:59"));
    }

    #[tokio::test]
    async fn test_compare_periods_requires_all_bounds() {
        let upstream = MockUpstream::returning(json!([]));
        let result = call(
            &upstream,
            "compare_periods",
            json!({ "period1_start": "2024-01-01", "period2_end": "" }),
        )
        .await;

        let text = text_of(&result);
        assert!(text.ends_with("are required"), "{text}");
        for name in ["period1_end", "period2_start", "period2_end"] {
            assert!(text.contains(name), "{text}");
        }
        assert!(!text.contains("period1_start"));
        assert_eq!(upstream.call_count(), 0);
    }

    #[test]
    fn test_period_bound() {
        assert_eq!(period_bound("2024-01-31", true), "2024-01-31T23:59:59");
        assert_eq!(period_bound("2024-01-01", false), "2024-01-01T00:00:00");
        assert_eq!(period_bound("2024-01-01T08:00:00", false), "2024-01-01T08:00:00");
    }
}
