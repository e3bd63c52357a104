use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{entity::sea_orm_active_enums::PrescriptionStatus, models::Prescription};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReviewPrescriptionRequest {
    /// `approved` or `rejected`.
    pub status: PrescriptionStatus,
    #[validate(length(max = 1000))]
    pub review_note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PrescriptionList {
    #[schema(value_type = Vec<Prescription>)]
    pub items: Vec<Prescription>,
}
