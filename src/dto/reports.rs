use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct DashboardSummary {
    pub users: i64,
    pub products: i64,
    pub orders: i64,
    pub pending_orders: i64,
    pub pending_prescriptions: i64,
    pub pending_product_requests: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct MonthlySales {
    /// `YYYY-MM`.
    pub month: String,
    pub orders: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct StatusBreakdown {
    pub status: String,
    pub orders: i64,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema, FromRow)]
pub struct TopProduct {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MonthlySalesQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TopProductsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct MonthlySalesReport {
    #[schema(value_type = Vec<MonthlySales>)]
    pub items: Vec<MonthlySales>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct StatusReport {
    #[schema(value_type = Vec<StatusBreakdown>)]
    pub items: Vec<StatusBreakdown>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TopProductsReport {
    #[schema(value_type = Vec<TopProduct>)]
    pub items: Vec<TopProduct>,
}
