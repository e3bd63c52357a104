mod common;

use chrono::{Datelike, Utc};
use pharmacy_store_api::{
    dto::{
        cart::AddToCartRequest,
        orders::CheckoutRequest,
        reports::{MonthlySalesQuery, TopProductsQuery},
    },
    entity::sea_orm_active_enums::{PaymentMethod, UserRole},
    error::AppError,
    middleware::auth::AuthUser,
    services::{address_service, cart_service, order_service, report_service},
    state::AppState,
};
use rust_decimal::Decimal;

async fn pending_count(state: &AppState, admin: &AuthUser) -> anyhow::Result<i64> {
    let report = report_service::orders_by_status(state, admin)
        .await?
        .data
        .expect("status report");
    Ok(report
        .items
        .iter()
        .find(|row| row.status == "pending")
        .map(|row| row.orders)
        .unwrap_or(0))
}

async fn this_month(state: &AppState, admin: &AuthUser) -> anyhow::Result<(i64, Decimal)> {
    let report = report_service::monthly_sales(state, admin, MonthlySalesQuery::default())
        .await?
        .data
        .expect("monthly report");
    let month = Utc::now().format("%Y-%m").to_string();
    Ok(report
        .items
        .iter()
        .find(|row| row.month == month)
        .map(|row| (row.orders, row.revenue))
        .unwrap_or((0, Decimal::ZERO)))
}

// Single test in this binary so the before/after deltas are not disturbed.
#[tokio::test]
async fn reports_track_placed_and_cancelled_orders() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let customer = common::create_user(&state, UserRole::User).await?;
    let product_id = common::create_product(&state, "5.00", 20, false).await?;
    address_service::create_address(&state, &customer, common::address_payload()).await?;

    let forbidden = report_service::summary(&state, &customer).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let before = report_service::summary(&state, &admin).await?.data.expect("summary");
    let pending_before = pending_count(&state, &admin).await?;
    let (month_orders, month_revenue) = this_month(&state, &admin).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?;
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
    .expect("order");

    let after = report_service::summary(&state, &admin).await?.data.expect("summary");
    assert_eq!(after.orders, before.orders + 1);
    assert_eq!(after.pending_orders, before.pending_orders + 1);
    assert_eq!(after.revenue, before.revenue + common::dec("10.00"));
    assert_eq!(pending_count(&state, &admin).await?, pending_before + 1);
    assert_eq!(
        this_month(&state, &admin).await?,
        (month_orders + 1, month_revenue + common::dec("10.00"))
    );

    let top = report_service::top_products(&state, &admin, TopProductsQuery { limit: Some(500) })
        .await?
        .data
        .expect("top products");
    assert!(top.items.len() <= 100);
    assert!(top.items.windows(2).all(|pair| pair[0].quantity >= pair[1].quantity));

    order_service::cancel_order(&state, &customer, placed.order.id).await?;

    let cancelled = report_service::summary(&state, &admin).await?.data.expect("summary");
    assert_eq!(cancelled.orders, before.orders + 1);
    assert_eq!(cancelled.pending_orders, before.pending_orders);
    assert_eq!(cancelled.revenue, before.revenue);
    assert_eq!(this_month(&state, &admin).await?, (month_orders, month_revenue));

    let last_year = report_service::monthly_sales(
        &state,
        &admin,
        MonthlySalesQuery {
            year: Some(Utc::now().year() - 1),
        },
    )
    .await?
    .data
    .expect("monthly report");
    let current = Utc::now().format("%Y-%m").to_string();
    assert!(last_year.items.iter().all(|row| row.month != current));

    Ok(())
}
