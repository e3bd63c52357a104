use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    audit::audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems, PayOrderRequest},
    entity::{
        addresses::{Column as AddrCol, Entity as Addresses},
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        prescriptions::{Column as RxCol, Entity as Prescriptions},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        sea_orm_active_enums::{
            NotificationKind, OrderStatus, PaymentMethod, PaymentStatus, PrescriptionStatus,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, Product},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{address_service, notification_service, offer_service},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// A cart line priced for checkout.
struct PricedLine {
    product: Product,
    quantity: i32,
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let address = match payload.address_id {
        Some(id) => Addresses::find_by_id(id)
            .filter(AddrCol::UserId.eq(user.user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::BadRequest("Address not found".into()))?,
        None => address_service::default_address(&txn, user.user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("No delivery address on file".into()))?,
    };

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    // Product rows are locked in id order so concurrent checkouts cannot deadlock.
    let product_ids: Vec<Uuid> = cart.iter().map(|item| item.product_id).collect();
    let mut products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let offers = offer_service::active_offers(&txn).await?;
    let mut lines = Vec::with_capacity(cart.len());
    for item in cart {
        let product = products.remove(&item.product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Product {} is no longer available", item.product_id))
        })?;
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }
        lines.push(PricedLine {
            product: pricing::resolve_offer_price(Product::from(product), &offers),
            quantity: item.quantity,
        });
    }

    if lines.iter().any(|l| l.product.requires_prescription) {
        let approved = Prescriptions::find()
            .filter(RxCol::UserId.eq(user.user_id))
            .filter(RxCol::Status.eq(PrescriptionStatus::Approved))
            .count(&txn)
            .await?;
        if approved == 0 {
            return Err(AppError::BadRequest(
                "An approved prescription is required for items in the cart".into(),
            ));
        }
    }

    let total_amount = order_total(&lines);
    let order_id = Uuid::new_v4();
    let now = Utc::now();

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        address_id: Set(Some(address.id)),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        payment_method: Set(payload.payment_method),
        payment_reference: Set(None),
        invoice_number: Set(build_invoice_number(order_id)),
        paid_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(line.product.id)),
            product_name: Set(line.product.name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.product.discount_price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(item));

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(ProdCol::Id.eq(line.product.id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total = %order.total_amount,
        items = order_items.len(),
        "order placed"
    );
    notification_service::emit(
        state,
        None,
        NotificationKind::Order,
        order.id,
        format!("New order {} placed", order.invoice_number),
    )
    .await;
    audit(
        state,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

fn order_total(lines: &[PricedLine]) -> Decimal {
    let total = lines
        .iter()
        .map(|l| pricing::line_total(l.product.discount_price, l.quantity))
        .sum();
    pricing::round2(total)
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !order.status.customer_can_cancel() {
        return Err(AppError::BadRequest(format!(
            "Order is {} and can no longer be cancelled",
            order.status.as_str()
        )));
    }

    let order = mark_cancelled(&txn, order).await?;
    restock_items(&txn, order.id).await?;
    let items = load_items(&txn, order.id).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, "order cancelled by customer");
    notification_service::emit(
        state,
        None,
        NotificationKind::Order,
        order.id,
        format!("Order {} was cancelled by the customer", order.invoice_number),
    )
    .await;
    audit(
        state,
        user.user_id,
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Sets the order cancelled; a paid order is marked refunded.
pub(crate) async fn mark_cancelled<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderModel> {
    let refund = order.payment_status == PaymentStatus::Paid;
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled);
    if refund {
        active.payment_status = Set(PaymentStatus::Refunded);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

/// Puts the quantities of an order's lines back into stock.
pub(crate) async fn restock_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?;

    let mut seen = HashSet::new();
    for item in items {
        let Some(product_id) = item.product_id else {
            continue;
        };
        seen.insert(product_id);
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(product_id))
            .exec(conn)
            .await?;
    }
    tracing::debug!(%order_id, products = seen.len(), "order restocked");
    Ok(())
}

pub(crate) async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}

pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_method != PaymentMethod::Online {
        return Err(AppError::BadRequest(
            "Cash on delivery orders are paid on delivery".into(),
        ));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::BadRequest("Order is cancelled".into()));
    }
    if order.payment_status == PaymentStatus::Paid {
        return Err(AppError::BadRequest("Order already paid".into()));
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Paid);
    active.payment_reference = Set(Some(payload.payment_reference));
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    let items = load_items(&txn, order.id).await?;
    txn.commit().await?;

    audit(
        state,
        user.user_id,
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Guard for admin status changes: terminal orders stay where they are.
pub fn ensure_admin_transition(from: OrderStatus, to: OrderStatus) -> AppResult<()> {
    if from.is_terminal() && from != to {
        return Err(AppError::BadRequest(format!(
            "Order is {} and cannot move to {}",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(())
}

pub fn build_invoice_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string();
    format!("INV-{}-{}", date, &suffix[..8]).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_has_date_and_order_prefix() {
        let id = Uuid::new_v4();
        let invoice = build_invoice_number(id);
        let parts: Vec<&str> = invoice.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "INV");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2], id.simple().to_string()[..8].to_uppercase());
    }

    #[test]
    fn terminal_orders_cannot_move() {
        assert!(ensure_admin_transition(OrderStatus::Pending, OrderStatus::Shipped).is_ok());
        assert!(ensure_admin_transition(OrderStatus::Shipped, OrderStatus::Delivered).is_ok());
        assert!(ensure_admin_transition(OrderStatus::Delivered, OrderStatus::Pending).is_err());
        assert!(ensure_admin_transition(OrderStatus::Cancelled, OrderStatus::Processing).is_err());
        assert!(ensure_admin_transition(OrderStatus::Cancelled, OrderStatus::Cancelled).is_ok());
    }
}
