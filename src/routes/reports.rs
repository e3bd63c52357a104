use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::reports::{
        DashboardSummary, MonthlySalesQuery, MonthlySalesReport, StatusReport, TopProductsQuery,
        TopProductsReport,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::report_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/monthly-sales", get(monthly_sales))
        .route("/orders-by-status", get(orders_by_status))
        .route("/top-products", get(top_products))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/summary",
    responses(
        (status = 200, description = "Dashboard counters and revenue", body = ApiResponse<DashboardSummary>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Reports"
)]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardSummary>>> {
    let resp = report_service::summary(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/monthly-sales",
    params(("year" = Option<i32>, Query, description = "Calendar year, default current")),
    responses(
        (status = 200, description = "Orders and revenue per month", body = ApiResponse<MonthlySalesReport>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Reports"
)]
pub async fn monthly_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MonthlySalesQuery>,
) -> AppResult<Json<ApiResponse<MonthlySalesReport>>> {
    let resp = report_service::monthly_sales(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/orders-by-status",
    responses(
        (status = 200, description = "Order count and amount per status", body = ApiResponse<StatusReport>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Reports"
)]
pub async fn orders_by_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StatusReport>>> {
    let resp = report_service::orders_by_status(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/top-products",
    params(("limit" = Option<i64>, Query, description = "Number of products, default 10")),
    responses(
        (status = 200, description = "Best sellers by quantity", body = ApiResponse<TopProductsReport>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Reports"
)]
pub async fn top_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TopProductsQuery>,
) -> AppResult<Json<ApiResponse<TopProductsReport>>> {
    let resp = report_service::top_products(&state, &user, query).await?;
    Ok(Json(resp))
}
