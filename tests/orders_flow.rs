mod common;

use pharmacy_store_api::{
    dto::{
        admin::InventoryAdjustRequest,
        cart::AddToCartRequest,
        orders::{CheckoutRequest, PayOrderRequest, UpdateOrderStatusRequest},
    },
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        products::Entity as Products,
        sea_orm_active_enums::{OrderStatus, PaymentMethod, PaymentStatus, UserRole},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{address_service, admin_service, cart_service, order_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} missing"))?;
    Ok(product.stock)
}

async fn fill_cart(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(state, user, AddToCartRequest { product_id, quantity }).await?;
    Ok(())
}

// Customer checks out and cancels; stock follows; admin cannot revive the order.
#[tokio::test]
async fn checkout_cancel_and_restock_flow() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };

    let customer = common::create_user(&state, UserRole::User).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let product_id = common::create_product(&state, "12.50", 10, false).await?;

    address_service::create_address(&state, &customer, common::address_payload()).await?;
    fill_cart(&state, &customer, product_id, 2).await?;
    fill_cart(&state, &customer, product_id, 1).await?;

    let placed = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Cod,
        },
    )
    .await?
    .data
    .expect("checkout data");

    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.total_amount, common::dec("37.50"));
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].quantity, 3);
    assert!(placed.order.invoice_number.starts_with("INV-"));
    assert_eq!(stock_of(&state, product_id).await?, 7);

    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    let cod_payment = order_service::pay_order(
        &state,
        &customer,
        placed.order.id,
        PayOrderRequest {
            payment_reference: "ref-1".into(),
        },
    )
    .await;
    assert!(matches!(cod_payment, Err(AppError::BadRequest(_))));

    let cancelled = order_service::cancel_order(&state, &customer, placed.order.id)
        .await?
        .data
        .expect("cancel data");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, product_id).await?, 10);

    let again = order_service::cancel_order(&state, &customer, placed.order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let revive = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Processing,
        },
    )
    .await;
    assert!(matches!(revive, Err(AppError::BadRequest(_))));

    let checkouts = AuditLogs::find()
        .filter(AuditCol::UserId.eq(customer.user_id))
        .filter(AuditCol::Action.eq("checkout"))
        .count(&state.orm)
        .await?;
    assert_eq!(checkouts, 1);

    Ok(())
}

#[tokio::test]
async fn checkout_guards_stock_and_empty_cart() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };

    let customer = common::create_user(&state, UserRole::User).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let product_id = common::create_product(&state, "5.00", 1, false).await?;
    address_service::create_address(&state, &customer, common::address_payload()).await?;

    let empty = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Online,
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let too_many = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&state, product_id).await?, 1);

    // Stock sold elsewhere between carting and checkout.
    fill_cart(&state, &customer, product_id, 1).await?;
    admin_service::adjust_inventory(
        &state,
        &admin,
        product_id,
        InventoryAdjustRequest { delta: -1 },
    )
    .await?;
    let sold_out = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Online,
        },
    )
    .await;
    assert!(matches!(sold_out, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&state, product_id).await?, 0);
    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn prescription_items_need_an_approved_prescription() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };

    let customer = common::create_user(&state, UserRole::User).await?;
    let product_id = common::create_product(&state, "30.00", 5, true).await?;
    address_service::create_address(&state, &customer, common::address_payload()).await?;
    fill_cart(&state, &customer, product_id, 1).await?;

    let result = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Online,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&state, product_id).await?, 5);

    Ok(())
}

#[tokio::test]
async fn online_payment_and_delivery() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };

    let customer = common::create_user(&state, UserRole::User).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let product_id = common::create_product(&state, "8.00", 4, false).await?;
    address_service::create_address(&state, &customer, common::address_payload()).await?;
    fill_cart(&state, &customer, product_id, 1).await?;

    let placed = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Online,
        },
    )
    .await?
    .data
    .expect("checkout data");

    let paid = order_service::pay_order(
        &state,
        &customer,
        placed.order.id,
        PayOrderRequest {
            payment_reference: "txn-42".into(),
        },
    )
    .await?
    .data
    .expect("payment data");
    assert_eq!(paid.order.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.order.status, OrderStatus::Pending);

    for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
        let updated = admin_service::update_order_status(
            &state,
            &admin,
            placed.order.id,
            UpdateOrderStatusRequest { status },
        )
        .await?
        .data
        .expect("order data");
        assert_eq!(updated.status, status);
    }

    let late_cancel = order_service::cancel_order(&state, &customer, placed.order.id).await;
    assert!(matches!(late_cancel, Err(AppError::BadRequest(_))));

    let by_customer = admin_service::update_order_status(
        &state,
        &customer,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await;
    assert!(matches!(by_customer, Err(AppError::Forbidden)));

    Ok(())
}
