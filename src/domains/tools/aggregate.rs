//! Aggregation helpers over already-fetched collections.
//!
//! Everything here is a pure function: no I/O, no hidden state. Callers fetch
//! first, bail out on an upstream error, and only then aggregate. Empty input
//! yields zero-valued or empty results.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// WooCommerce uses this customer id for guest checkouts.
pub const GUEST_CUSTOMER_ID: i64 = 0;

/// Read a money amount sent either as a JSON string (`"19.99"`) or a number.
pub fn money(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

/// Calendar day of an order's `date_created` (`YYYY-MM-DDTHH:MM:SS` or RFC 3339).
pub fn order_day(order: &Value) -> Option<NaiveDate> {
    let raw = order.get("date_created")?.as_str()?;
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn line_item_count(order: &Value) -> usize {
    order
        .get("line_items")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn field(item: &Value, name: &str) -> Value {
    item.get(name).cloned().unwrap_or(Value::Null)
}

// ============================================================================
// Sales trends
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestDay {
    pub date: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesTrends {
    pub total_orders: usize,
    pub total_revenue: f64,
    pub average_order_value: f64,
    pub average_items_per_order: f64,
    pub daily_average_revenue: f64,
    pub best_day: Option<BestDay>,
}

/// Per-day revenue and item sums plus overall totals.
///
/// Returns `None` for an empty collection. Orders without a readable date
/// count towards the totals but towards no day. Ties for the best day go to
/// the earliest date.
pub fn sales_trends(orders: &[Value]) -> Option<SalesTrends> {
    if orders.is_empty() {
        return None;
    }

    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    let mut total_revenue = 0.0;
    let mut total_items = 0;

    for order in orders {
        let total = money(order.get("total"));
        let items = line_item_count(order);
        total_revenue += total;
        total_items += items;

        if let Some(day) = order_day(order) {
            let entry = days.entry(day).or_insert((0.0, 0));
            entry.0 += total;
            entry.1 += items;
        }
    }

    let mut best_day: Option<BestDay> = None;
    for (day, (revenue, _)) in &days {
        if best_day.as_ref().is_none_or(|best| *revenue > best.revenue) {
            best_day = Some(BestDay {
                date: day.to_string(),
                revenue: *revenue,
            });
        }
    }

    let daily_total: f64 = days.values().map(|(revenue, _)| revenue).sum();

    Some(SalesTrends {
        total_orders: orders.len(),
        total_revenue: round2(total_revenue),
        average_order_value: round2(mean(total_revenue, orders.len())),
        average_items_per_order: round2(mean(total_items as f64, orders.len())),
        daily_average_revenue: round2(mean(daily_total, days.len())),
        best_day: best_day.map(|b| BestDay {
            revenue: round2(b.revenue),
            ..b
        }),
    })
}

// ============================================================================
// Low stock
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowStockItem {
    pub id: Value,
    pub name: Value,
    pub sku: Value,
    pub stock_quantity: Value,
    pub price: Value,
    pub manage_stock: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowStockReport {
    pub total_low_stock_products: usize,
    pub threshold: i64,
    pub products: Vec<LowStockItem>,
}

/// Numeric stock level and the value as the store reported it.
fn stock_quantity(product: &Value) -> Option<(f64, &Value)> {
    let qty = product.get("stock_quantity")?;
    qty.as_f64().map(|level| (level, qty))
}

/// Products with a defined stock quantity at or below `threshold`, lowest first.
pub fn low_stock(products: &[Value], threshold: i64) -> LowStockReport {
    let mut levels: Vec<(f64, LowStockItem)> = products
        .iter()
        .filter_map(|p| {
            let (level, qty) = stock_quantity(p)?;
            (level <= threshold as f64).then(|| {
                let item = LowStockItem {
                    id: field(p, "id"),
                    name: field(p, "name"),
                    sku: field(p, "sku"),
                    stock_quantity: qty.clone(),
                    price: field(p, "price"),
                    manage_stock: field(p, "manage_stock"),
                };
                (level, item)
            })
        })
        .collect();

    // stable: equal quantities keep their fetch order
    levels.sort_by(|a, b| a.0.total_cmp(&b.0));
    let items: Vec<LowStockItem> = levels.into_iter().map(|(_, item)| item).collect();

    LowStockReport {
        total_low_stock_products: items.len(),
        threshold,
        products: items,
    }
}

// ============================================================================
// Frequent buyers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentBuyer {
    pub customer_id: i64,
    pub name: String,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentBuyersReport {
    pub min_orders: usize,
    pub orders_analyzed: usize,
    pub total_frequent_buyers: usize,
    pub customers: Vec<FrequentBuyer>,
}

fn billing_name(order: &Value) -> String {
    let part = |key: &str| {
        order
            .get("billing")
            .and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    format!("{} {}", part("first_name"), part("last_name"))
        .trim()
        .to_string()
}

/// Registered customers with at least `min_orders` orders, most orders first.
pub fn frequent_buyers(orders: &[Value], min_orders: usize) -> FrequentBuyersReport {
    let mut groups: Vec<FrequentBuyer> = Vec::new();
    let mut index: HashMap<(i64, String), usize> = HashMap::new();

    for order in orders {
        let customer_id = order
            .get("customer_id")
            .and_then(Value::as_i64)
            .unwrap_or(GUEST_CUSTOMER_ID);
        if customer_id == GUEST_CUSTOMER_ID {
            continue;
        }

        let name = billing_name(order);
        let key = (customer_id, name.clone());
        match index.get(&key) {
            Some(&i) => groups[i].order_count += 1,
            None => {
                index.insert(key, groups.len());
                groups.push(FrequentBuyer {
                    customer_id,
                    name,
                    order_count: 1,
                });
            }
        }
    }

    groups.retain(|g| g.order_count >= min_orders);
    groups.sort_by(|a, b| b.order_count.cmp(&a.order_count));

    FrequentBuyersReport {
        min_orders,
        orders_analyzed: orders.len(),
        total_frequent_buyers: groups.len(),
        customers: groups,
    }
}

// ============================================================================
// Revenue by category
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category_id: Value,
    pub name: Value,
    pub product_count: usize,
    pub estimated_revenue: f64,
}

/// Estimate a category's revenue as Σ(total_sales × price) over its products.
pub fn category_revenue(category: &Value, products: &[Value]) -> CategoryRevenue {
    let estimated: f64 = products
        .iter()
        .map(|p| money(p.get("total_sales")) * money(p.get("price")))
        .sum();

    CategoryRevenue {
        category_id: field(category, "id"),
        name: field(category, "name"),
        product_count: products.len(),
        estimated_revenue: round2(estimated),
    }
}

/// Order categories by descending estimated revenue.
pub fn rank_categories(mut categories: Vec<CategoryRevenue>) -> Vec<CategoryRevenue> {
    categories.sort_by(|a, b| {
        b.estimated_revenue
            .partial_cmp(&a.estimated_revenue)
            .unwrap_or(Ordering::Equal)
    });
    categories
}

// ============================================================================
// Customer lifetime value
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifetimeValue {
    pub customer_id: String,
    pub total_orders: usize,
    pub total_spent: f64,
    pub average_order_value: f64,
    pub first_order_date: Option<Value>,
    pub last_order_date: Option<Value>,
}

/// Summarize one customer's completed orders.
///
/// `orders` is expected newest first, as the store returns them.
pub fn lifetime_value(customer_id: &str, orders: &[Value]) -> LifetimeValue {
    let total: f64 = orders.iter().map(|o| money(o.get("total"))).sum();
    let date = |order: Option<&Value>| order.and_then(|o| o.get("date_created")).cloned();

    LifetimeValue {
        customer_id: customer_id.to_string(),
        total_orders: orders.len(),
        total_spent: round2(total),
        average_order_value: round2(mean(total, orders.len())),
        first_order_date: date(orders.last()),
        last_order_date: date(orders.first()),
    }
}

// ============================================================================
// Period comparison
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start: String,
    pub end: String,
    pub order_count: usize,
    pub revenue: f64,
    pub average_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub period1: PeriodSummary,
    pub period2: PeriodSummary,
    pub revenue_change: f64,
    /// `None` when the first period had no revenue.
    pub revenue_change_pct: Option<f64>,
}

pub fn summarize_period(start: &str, end: &str, orders: &[Value]) -> PeriodSummary {
    let revenue: f64 = orders.iter().map(|o| money(o.get("total"))).sum();
    PeriodSummary {
        start: start.to_string(),
        end: end.to_string(),
        order_count: orders.len(),
        revenue: round2(revenue),
        average_order_value: round2(mean(revenue, orders.len())),
    }
}

pub fn compare_periods(period1: PeriodSummary, period2: PeriodSummary) -> PeriodComparison {
    let change = period2.revenue - period1.revenue;
    let pct = if period1.revenue == 0.0 {
        None
    } else {
        Some(round2(change / period1.revenue * 100.0))
    };

    PeriodComparison {
        revenue_change: round2(change),
        revenue_change_pct: pct,
        period1,
        period2,
    }
}
