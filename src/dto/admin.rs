use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::User;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InventoryAdjustRequest {
    #[validate(range(min = -100000, max = 100000))]
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}
