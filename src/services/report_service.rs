use chrono::{Datelike, Utc};

use crate::{
    dto::reports::{
        DashboardSummary, MonthlySales, MonthlySalesQuery, MonthlySalesReport, StatusBreakdown,
        StatusReport, TopProduct, TopProductsQuery, TopProductsReport,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const DEFAULT_TOP_PRODUCTS: i64 = 10;

pub async fn summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardSummary>> {
    ensure_admin(user)?;
    let summary = sqlx::query_as::<_, DashboardSummary>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM products) AS products,
            (SELECT COUNT(*) FROM orders) AS orders,
            (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
            (SELECT COUNT(*) FROM prescriptions WHERE status = 'pending') AS pending_prescriptions,
            (SELECT COUNT(*) FROM product_requests WHERE request_status = 'pending') AS pending_product_requests,
            (SELECT COALESCE(SUM(total_amount), 0)::NUMERIC(12, 2)
               FROM orders WHERE status <> 'cancelled') AS revenue
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Summary", summary, None))
}

pub async fn monthly_sales(
    state: &AppState,
    user: &AuthUser,
    query: MonthlySalesQuery,
) -> AppResult<ApiResponse<MonthlySalesReport>> {
    ensure_admin(user)?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let items = sqlx::query_as::<_, MonthlySales>(
        r#"
        SELECT to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
               COUNT(*) AS orders,
               COALESCE(SUM(total_amount), 0)::NUMERIC(12, 2) AS revenue
        FROM orders
        WHERE status <> 'cancelled'
          AND EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC') = $1
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(year)
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Monthly sales",
        MonthlySalesReport { items },
        Some(Meta::total(total)),
    ))
}

pub async fn orders_by_status(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<StatusReport>> {
    ensure_admin(user)?;
    let items = sqlx::query_as::<_, StatusBreakdown>(
        r#"
        SELECT status,
               COUNT(*) AS orders,
               COALESCE(SUM(total_amount), 0)::NUMERIC(12, 2) AS amount
        FROM orders
        GROUP BY status
        ORDER BY orders DESC, status
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Orders by status",
        StatusReport { items },
        Some(Meta::total(total)),
    ))
}

pub async fn top_products(
    state: &AppState,
    user: &AuthUser,
    query: TopProductsQuery,
) -> AppResult<ApiResponse<TopProductsReport>> {
    ensure_admin(user)?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_PRODUCTS).clamp(1, 100);

    let items = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT oi.product_id,
               oi.product_name,
               SUM(oi.quantity)::BIGINT AS quantity,
               COALESCE(SUM(oi.price * oi.quantity), 0)::NUMERIC(12, 2) AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.status <> 'cancelled'
        GROUP BY oi.product_id, oi.product_name
        ORDER BY quantity DESC, revenue DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Top products",
        TopProductsReport { items },
        Some(Meta::total(total)),
    ))
}
