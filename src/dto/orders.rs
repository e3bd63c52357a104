use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entity::sea_orm_active_enums::{OrderStatus, PaymentMethod},
    models::{Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CheckoutRequest {
    /// Falls back to the caller's default address when omitted.
    pub address_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PayOrderRequest {
    #[validate(length(min = 1, max = 200, message = "Payment reference is required"))]
    pub payment_reference: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
