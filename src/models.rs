use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    addresses, notifications, offers, order_items, orders, prescriptions, product_requests,
    products, users,
    sea_orm_active_enums::{
        NotificationKind, OfferStatus, OrderStatus, PaymentMethod, PaymentStatus,
        PrescriptionStatus, RequestStatus, UserRole,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
    #[schema(value_type = String, example = "10.00")]
    pub discount: Decimal,
    #[schema(value_type = String, example = "108.00")]
    pub discount_price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub requires_prescription: bool,
    /// Set when the price comes from a running offer.
    pub offer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Offer {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "15.00")]
    pub discount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: OfferStatus,
    pub product_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Option<Uuid>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub invoice_number: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Prescription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_url: String,
    pub file_name: String,
    pub content_type: String,
    pub notes: Option<String>,
    pub status: PrescriptionStatus,
    pub review_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub request_status: RequestStatus,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub target_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            price: model.price,
            discount: model.discount,
            discount_price: model.discount_price,
            stock: model.stock,
            image_url: model.image_url,
            requires_prescription: model.requires_prescription,
            offer_id: None,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl Offer {
    pub fn from_entity(model: offers::Model, product_ids: Vec<Uuid>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            discount: model.discount,
            start_date: model.start_date.with_timezone(&Utc),
            end_date: model.end_date.with_timezone(&Utc),
            status: model.status,
            product_ids,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            full_name: model.full_name,
            phone: model.phone,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            is_default: model.is_default,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            address_id: model.address_id,
            total_amount: model.total_amount,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            payment_reference: model.payment_reference,
            invoice_number: model.invoice_number,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<prescriptions::Model> for Prescription {
    fn from(model: prescriptions::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            file_url: model.file_url,
            file_name: model.file_name,
            content_type: model.content_type,
            notes: model.notes,
            status: model.status,
            review_note: model.review_note,
            reviewed_by: model.reviewed_by,
            reviewed_at: model.reviewed_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<product_requests::Model> for ProductRequest {
    fn from(model: product_requests::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            quantity: model.quantity,
            notes: model.notes,
            request_status: model.request_status,
            admin_note: model.admin_note,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<notifications::Model> for Notification {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            kind: model.kind,
            target_id: model.target_id,
            message: model.message,
            is_read: model.is_read,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
