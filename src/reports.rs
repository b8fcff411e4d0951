// Basic reporting for the admin dashboard
//
// Aggregations over completed orders: volume per day, sales per category,
// best customers. Read-only; everything is computed in SQL.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;
use crate::AppState;

/// Optional date-range filter shared by the report endpoints
#[derive(Debug, Deserialize)]
pub struct ReportRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Orders placed per day
#[derive(Debug, Serialize, FromRow)]
pub struct OrdersPerDay {
    pub day: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

/// Sales grouped by menu category
#[derive(Debug, Serialize, FromRow)]
pub struct CategorySales {
    pub category: String,
    pub items_sold: i64,
    pub revenue: Decimal,
}

/// Customers ranked by completed-order spend
#[derive(Debug, Serialize, FromRow)]
pub struct TopCustomer {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub orders: i64,
    pub total_spent: Decimal,
}

fn range_bounds(range: &ReportRange) -> (NaiveDate, NaiveDate) {
    // Wide-open defaults that stay inside the DATE range PostgreSQL accepts
    let start = range
        .start
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN));
    let end = range
        .end
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX));
    (start, end)
}

/// Handler for GET /api/admin/reports/orders-per-day
pub async fn orders_per_day_handler(
    State(state): State<AppState>,
    Query(range): Query<ReportRange>,
) -> Result<Json<Vec<OrdersPerDay>>, ApiError> {
    let (start, end) = range_bounds(&range);

    let rows = sqlx::query_as::<_, OrdersPerDay>(
        r#"
        SELECT created_at::date AS day, COUNT(*) AS orders, COALESCE(SUM(total), 0) AS revenue
        FROM orders
        WHERE status = 'completed' AND created_at::date BETWEEN $1 AND $2
        GROUP BY created_at::date
        ORDER BY day
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// Handler for GET /api/admin/reports/category-sales
///
/// Lines whose product has since been deleted fall into "Other".
pub async fn category_sales_handler(
    State(state): State<AppState>,
    Query(range): Query<ReportRange>,
) -> Result<Json<Vec<CategorySales>>, ApiError> {
    let (start, end) = range_bounds(&range);

    let rows = sqlx::query_as::<_, CategorySales>(
        r#"
        SELECT COALESCE(c.name, 'Other') AS category,
               COALESCE(SUM(oi.quantity), 0) AS items_sold,
               COALESCE(SUM(oi.quantity * oi.unit_price), 0) AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        LEFT JOIN products p ON p.id = oi.product_id
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE o.status = 'completed' AND o.created_at::date BETWEEN $1 AND $2
        GROUP BY COALESCE(c.name, 'Other')
        ORDER BY revenue DESC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// Handler for GET /api/admin/reports/top-customers
pub async fn top_customers_handler(
    State(state): State<AppState>,
    Query(range): Query<ReportRange>,
) -> Result<Json<Vec<TopCustomer>>, ApiError> {
    let (start, end) = range_bounds(&range);

    let rows = sqlx::query_as::<_, TopCustomer>(
        r#"
        SELECT customer_name, customer_phone,
               COUNT(*) AS orders, COALESCE(SUM(total), 0) AS total_spent
        FROM orders
        WHERE status = 'completed' AND created_at::date BETWEEN $1 AND $2
        GROUP BY customer_name, customer_phone
        ORDER BY total_spent DESC
        LIMIT 20
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}
