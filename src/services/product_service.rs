use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit::audit,
    dto::products::{CategoryList, CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::offer_service,
    state::AppState,
    storage::{IMAGE_TYPES, Upload},
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern.clone()))
                .add(Expr::col(Column::Category).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Category).ilike(category.clone()));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::DiscountPrice.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::DiscountPrice.lte(max_price));
    }

    if query.in_stock.unwrap_or(false) {
        condition = condition.add(Column::Stock.gt(0));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::DiscountPrice,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Stock => Column::Stock,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items: Vec<Product> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    let items = offer_service::apply_offers(&state.orm, items).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from)
        .ok_or(AppError::NotFound)?;

    let offers = offer_service::active_offers(&state.orm).await?;
    let product = pricing::resolve_offer_price(product, &offers);
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<String> = Products::find()
        .select_only()
        .column(Column::Category)
        .distinct()
        .order_by_asc(Column::Category)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    pricing::validate_price(payload.price)?;
    let discount = payload.discount.unwrap_or(Decimal::ZERO);
    pricing::validate_discount(discount)?;
    ensure_name_free(state, &payload.name, None).await?;

    let price = pricing::round2(payload.price);
    let discount = pricing::round2(discount);
    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        category: Set(payload.category.trim().to_string()),
        price: Set(price),
        discount: Set(discount),
        discount_price: Set(pricing::discount_price(price, discount)),
        stock: Set(payload.stock),
        image_url: Set(None),
        requires_prescription: Set(payload.requires_prescription.unwrap_or(false)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let product = active.insert(&state.orm).await?;

    tracing::info!(product_id = %product.id, "product created");
    audit(
        state,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(name) = payload.name.as_deref() {
        ensure_name_free(state, name, Some(id)).await?;
    }

    let price = match payload.price {
        Some(price) => {
            pricing::validate_price(price)?;
            pricing::round2(price)
        }
        None => existing.price,
    };
    let discount = match payload.discount {
        Some(discount) => {
            pricing::validate_discount(discount)?;
            pricing::round2(discount)
        }
        None => existing.discount,
    };
    let reprice = payload.price.is_some() || payload.discount.is_some();

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category.trim().to_string());
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(requires_prescription) = payload.requires_prescription {
        active.requires_prescription = Set(requires_prescription);
    }
    if reprice {
        active.price = Set(price);
        active.discount = Set(discount);
        active.discount_price = Set(pricing::discount_price(price, discount));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit(
        state,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Products::delete_by_id(id).exec(&state.orm).await?;
    if let Some(url) = existing.image_url.as_deref() {
        state.uploads.remove(url).await;
    }

    audit(
        state,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    upload: Upload,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let stored = state.uploads.save("products", &upload, IMAGE_TYPES).await?;
    let previous = existing.image_url.clone();

    let mut active: ActiveModel = existing.into();
    active.image_url = Set(Some(stored.url));
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    if let Some(url) = previous.as_deref() {
        state.uploads.remove(url).await;
    }

    audit(
        state,
        user.user_id,
        "product_image_upload",
        "products",
        serde_json::json!({ "product_id": id, "file_name": upload.file_name }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image uploaded",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

async fn ensure_name_free(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Name.eq(name.trim()));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.count(&state.orm).await? > 0 {
        return Err(AppError::Conflict(format!("product {} already exists", name.trim())));
    }
    Ok(())
}
