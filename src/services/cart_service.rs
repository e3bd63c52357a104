use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::audit,
    dto::cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    pricing,
    response::{ApiResponse, Meta},
    services::offer_service,
    state::AppState,
};

/// Builds the caller's cart with offer pricing applied to every line.
pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let offers = offer_service::active_offers(&state.orm).await?;
    let lines: Vec<(CartModel, Product)> = rows
        .into_iter()
        .filter_map(|(item, product)| {
            product.map(|p| (item, pricing::resolve_offer_price(Product::from(p), &offers)))
        })
        .collect();

    let view = build_view(lines);
    let meta = Meta::total(view.items.len() as i64);
    Ok(ApiResponse::success("Cart", view, Some(meta)))
}

fn build_view(lines: Vec<(CartModel, Product)>) -> CartView {
    let mut subtotal = Decimal::ZERO;
    let mut item_count: i64 = 0;
    let items = lines
        .into_iter()
        .map(|(item, product)| {
            let line_total = pricing::line_total(product.discount_price, item.quantity);
            subtotal += line_total;
            item_count += i64::from(item.quantity);
            CartLine {
                id: item.id,
                product,
                quantity: item.quantity,
                line_total,
            }
        })
        .collect();

    CartView {
        items,
        item_count,
        subtotal: pricing::round2(subtotal),
    }
}

async fn find_product(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))
}

async fn find_line(state: &AppState, user: &AuthUser, product_id: Uuid) -> AppResult<Option<CartModel>> {
    Ok(CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?)
}

/// Quantity of a line after adding `extra` more units.
fn merged_quantity(current: i32, extra: i32) -> AppResult<i32> {
    current
        .checked_add(extra)
        .ok_or_else(|| AppError::BadRequest("quantity is too large".to_string()))
}

fn ensure_stock(product: &ProductModel, quantity: i32) -> AppResult<()> {
    if quantity > product.stock {
        return Err(AppError::BadRequest(format!(
            "only {} of {} in stock",
            product.stock, product.name
        )));
    }
    Ok(())
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = find_product(state, payload.product_id).await?;

    match find_line(state, user, payload.product_id).await? {
        Some(item) => {
            let quantity = merged_quantity(item.quantity, payload.quantity)?;
            ensure_stock(&product, quantity)?;
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
        }
        None => {
            ensure_stock(&product, payload.quantity)?;
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(payload.product_id),
                quantity: Set(payload.quantity),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?;
        }
    }

    audit(
        state,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    get_cart(state, user).await
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let item = find_line(state, user, product_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = find_product(state, product_id).await?;
    ensure_stock(&product, payload.quantity)?;

    let mut active: CartActive = item.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;

    get_cart(state, user).await
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit(
        state,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::done("Removed from cart"))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    tracing::debug!(user_id = %user.user_id, removed = result.rows_affected, "cart cleared");
    Ok(ApiResponse::done("Cart cleared"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    fn product(discount_price: &str) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Paracetamol".into(),
            description: None,
            category: "pain".into(),
            price: dec("10.00"),
            discount: dec("0"),
            discount_price: dec(discount_price),
            stock: 50,
            image_url: None,
            requires_prescription: false,
            offer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(product: &Product, quantity: i32) -> CartModel {
        CartModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: product.id,
            quantity,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn view_sums_lines_at_discounted_price() {
        let a = product("9.99");
        let b = product("4.50");
        let view = build_view(vec![(line(&a, 3), a.clone()), (line(&b, 2), b.clone())]);

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].line_total, dec("29.97"));
        assert_eq!(view.items[1].line_total, dec("9.00"));
        assert_eq!(view.subtotal, dec("38.97"));
        assert_eq!(view.item_count, 5);
    }

    #[test]
    fn empty_cart_has_zero_subtotal() {
        let view = build_view(Vec::new());
        assert!(view.items.is_empty());
        assert_eq!(view.subtotal, Decimal::ZERO);
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn merged_quantity_rejects_overflow() {
        assert_eq!(merged_quantity(2, 3).ok(), Some(5));
        assert!(matches!(
            merged_quantity(1, i32::MAX),
            Err(AppError::BadRequest(_))
        ));
    }
}
