mod common;

use chrono::{Duration, Utc};
use common::dec;
use pharmacy_store_api::{
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        offers::CreateOfferRequest,
        products::CreateProductRequest,
    },
    entity::sea_orm_active_enums::{OfferStatus, UserRole},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::ProductQuery,
    services::{cart_service, offer_service, product_service},
    state::AppState,
};
use uuid::Uuid;

async fn running_offer(
    state: &AppState,
    admin: &AuthUser,
    discount: &str,
    product_ids: Vec<Uuid>,
) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let offer = offer_service::create_offer(
        state,
        admin,
        CreateOfferRequest {
            title: format!("Offer {discount}%"),
            description: None,
            discount: dec(discount),
            start_date: now - Duration::hours(1),
            end_date: now + Duration::days(1),
            status: Some(OfferStatus::Active),
            product_ids,
        },
    )
    .await?
    .data
    .expect("offer");
    Ok(offer.id)
}

#[tokio::test]
async fn created_products_carry_their_discount_price() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let name = format!("Ibuprofen 200mg {}", Uuid::new_v4());

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: name.clone(),
            description: Some("Pain relief".into()),
            category: "pain relief".into(),
            price: dec("19.99"),
            discount: Some(dec("12.5")),
            stock: 40,
            requires_prescription: None,
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.discount_price, dec("17.49"));

    let duplicate = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name,
            description: None,
            category: "pain relief".into(),
            price: dec("1.00"),
            discount: None,
            stock: 1,
            requires_prescription: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn catalog_serves_the_oldest_running_offer() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let product_id = common::create_product(&state, "20.00", 10, false).await?;
    let plain_id = common::create_product(&state, "20.00", 10, false).await?;

    let older = running_offer(&state, &admin, "25", vec![product_id]).await?;
    running_offer(&state, &admin, "50", vec![product_id]).await?;

    let product = product_service::get_product(&state, product_id)
        .await?
        .data
        .expect("product");
    assert_eq!(product.offer_id, Some(older));
    assert_eq!(product.discount, dec("25.00"));
    assert_eq!(product.discount_price, dec("15.00"));

    let plain = product_service::get_product(&state, plain_id)
        .await?
        .data
        .expect("product");
    assert_eq!(plain.offer_id, None);
    assert_eq!(plain.discount_price, dec("20.00"));

    let listed = product_service::list_products(
        &state,
        ProductQuery {
            q: Some(product_id.to_string()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].discount_price, dec("15.00"));

    Ok(())
}

#[tokio::test]
async fn cart_quantity_is_capped_by_stock() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, UserRole::User).await?;
    let product_id = common::create_product(&state, "4.00", 3, false).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await?;

    let past_stock = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 2,
        },
    )
    .await;
    assert!(matches!(past_stock, Err(AppError::BadRequest(_))));

    let overflow = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: i32::MAX,
        },
    )
    .await;
    assert!(matches!(overflow, Err(AppError::BadRequest(_))));

    let too_many = cart_service::update_item(
        &state,
        &customer,
        product_id,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    let cart = cart_service::update_item(
        &state,
        &customer,
        product_id,
        UpdateCartItemRequest { quantity: 3 },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.item_count, 3);
    assert_eq!(cart.subtotal, dec("12.00"));

    Ok(())
}
