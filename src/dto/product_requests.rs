use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{entity::sea_orm_active_enums::RequestStatus, models::ProductRequest};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NewProductRequest {
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i32,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct EditProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub quantity: Option<i32>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateRequestStatus {
    pub status: RequestStatus,
    #[validate(length(max = 1000))]
    pub admin_note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductRequestList {
    #[schema(value_type = Vec<ProductRequest>)]
    pub items: Vec<ProductRequest>,
}
