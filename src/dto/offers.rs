use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{entity::sea_orm_active_enums::OfferStatus, models::Offer};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateOfferRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "15")]
    pub discount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Option<OfferStatus>,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateOfferRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub discount: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<OfferStatus>,
    pub product_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OfferList {
    #[schema(value_type = Vec<Offer>)]
    pub items: Vec<Offer>,
}
