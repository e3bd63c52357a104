use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::audit,
    dto::offers::{CreateOfferRequest, OfferList, UpdateOfferRequest},
    entity::{
        offer_products::{ActiveModel as OfferProductActive, Column as OfferProductCol, Entity as OfferProducts},
        offers::{ActiveModel as OfferActive, Column as OfferCol, Entity as Offers, Model as OfferModel},
        products::{Column as ProdCol, Entity as Products},
        sea_orm_active_enums::OfferStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Offer, Product},
    pricing::{self, ActiveOffer},
    response::{ApiResponse, Meta},
    routes::params::OfferListQuery,
    state::AppState,
};

/// Offers running right now, oldest first, with the products each covers.
pub async fn active_offers<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<ActiveOffer>> {
    let now = Utc::now();
    let offers = Offers::find()
        .filter(OfferCol::Status.eq(OfferStatus::Active))
        .filter(OfferCol::StartDate.lte(now))
        .filter(OfferCol::EndDate.gte(now))
        .order_by_asc(OfferCol::CreatedAt)
        .order_by_asc(OfferCol::Id)
        .all(conn)
        .await?;

    let ids: Vec<Uuid> = offers.iter().map(|o| o.id).collect();
    let mut product_ids = load_product_ids(conn, &ids).await?;

    Ok(offers
        .into_iter()
        .map(|offer| ActiveOffer {
            offer_id: offer.id,
            discount: offer.discount,
            product_ids: product_ids.remove(&offer.id).unwrap_or_default(),
        })
        .collect())
}

/// Applies running offers to products loaded from the database.
pub async fn apply_offers<C: ConnectionTrait>(
    conn: &C,
    products: Vec<Product>,
) -> AppResult<Vec<Product>> {
    if products.is_empty() {
        return Ok(products);
    }
    let offers = active_offers(conn).await?;
    Ok(pricing::resolve_offer_prices(products, &offers))
}

async fn load_product_ids<C: ConnectionTrait>(
    conn: &C,
    offer_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if offer_ids.is_empty() {
        return Ok(map);
    }
    let rows = OfferProducts::find()
        .filter(OfferProductCol::OfferId.is_in(offer_ids.iter().copied()))
        .all(conn)
        .await?;
    for row in rows {
        map.entry(row.offer_id).or_default().push(row.product_id);
    }
    Ok(map)
}

async fn to_offers<C: ConnectionTrait>(conn: &C, models: Vec<OfferModel>) -> AppResult<Vec<Offer>> {
    let ids: Vec<Uuid> = models.iter().map(|o| o.id).collect();
    let mut product_ids = load_product_ids(conn, &ids).await?;
    Ok(models
        .into_iter()
        .map(|model| {
            let products = product_ids.remove(&model.id).unwrap_or_default();
            Offer::from_entity(model, products)
        })
        .collect())
}

pub async fn list_offers(
    state: &AppState,
    user: &AuthUser,
    query: OfferListQuery,
) -> AppResult<ApiResponse<OfferList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Offers::find().order_by_desc(OfferCol::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(OfferCol::Status.eq(status));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = to_offers(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Offers",
        OfferList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_active_offers(state: &AppState) -> AppResult<ApiResponse<OfferList>> {
    let now = Utc::now();
    let models = Offers::find()
        .filter(OfferCol::Status.eq(OfferStatus::Active))
        .filter(OfferCol::StartDate.lte(now))
        .filter(OfferCol::EndDate.gte(now))
        .order_by_asc(OfferCol::EndDate)
        .all(&state.orm)
        .await?;
    let items = to_offers(&state.orm, models).await?;
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Active offers",
        OfferList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn get_offer(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Offer>> {
    let model = Offers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let offer = to_offers(&state.orm, vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Offer", offer, None))
}

pub async fn create_offer(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOfferRequest,
) -> AppResult<ApiResponse<Offer>> {
    ensure_admin(user)?;
    pricing::validate_discount(payload.discount)?;
    validate_window(payload.start_date, payload.end_date)?;

    let product_ids = dedup(payload.product_ids);
    let txn = state.orm.begin().await?;
    ensure_products_exist(&txn, &product_ids).await?;

    let now = Utc::now();
    let offer = OfferActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        description: Set(payload.description),
        discount: Set(pricing::round2(payload.discount)),
        start_date: Set(payload.start_date.into()),
        end_date: Set(payload.end_date.into()),
        status: Set(payload.status.unwrap_or(OfferStatus::Active)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    replace_products(&txn, offer.id, &product_ids).await?;
    txn.commit().await?;

    tracing::info!(offer_id = %offer.id, products = product_ids.len(), "offer created");
    audit(
        state,
        user.user_id,
        "offer_create",
        "offers",
        serde_json::json!({ "offer_id": offer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Offer created",
        Offer::from_entity(offer, product_ids),
        Some(Meta::empty()),
    ))
}

pub async fn update_offer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOfferRequest,
) -> AppResult<ApiResponse<Offer>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let existing = Offers::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let start = payload
        .start_date
        .unwrap_or_else(|| existing.start_date.with_timezone(&Utc));
    let end = payload
        .end_date
        .unwrap_or_else(|| existing.end_date.with_timezone(&Utc));
    validate_window(start, end)?;

    let mut active: OfferActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(discount) = payload.discount {
        pricing::validate_discount(discount)?;
        active.discount = Set(pricing::round2(discount));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.start_date = Set(start.into());
    active.end_date = Set(end.into());
    active.updated_at = Set(Utc::now().into());
    let offer = active.update(&txn).await?;

    if let Some(product_ids) = payload.product_ids {
        let product_ids = dedup(product_ids);
        ensure_products_exist(&txn, &product_ids).await?;
        replace_products(&txn, offer.id, &product_ids).await?;
    }

    let offer = to_offers(&txn, vec![offer])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    txn.commit().await?;

    audit(
        state,
        user.user_id,
        "offer_update",
        "offers",
        serde_json::json!({ "offer_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Offer updated", offer, Some(Meta::empty())))
}

pub async fn delete_offer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Offers::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit(
        state,
        user.user_id,
        "offer_delete",
        "offers",
        serde_json::json!({ "offer_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Offer deleted"))
}

fn validate_window(start: chrono::DateTime<Utc>, end: chrono::DateTime<Utc>) -> AppResult<()> {
    if start > end {
        return Err(AppError::BadRequest(
            "start_date must not be after end_date".into(),
        ));
    }
    Ok(())
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

async fn ensure_products_exist<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = Products::find()
        .filter(ProdCol::Id.is_in(ids.iter().copied()))
        .count(conn)
        .await?;
    if found as usize != ids.len() {
        return Err(AppError::BadRequest(
            "offer references unknown products".into(),
        ));
    }
    Ok(())
}

async fn replace_products<C: ConnectionTrait>(
    conn: &C,
    offer_id: Uuid,
    product_ids: &[Uuid],
) -> AppResult<()> {
    OfferProducts::delete_many()
        .filter(OfferProductCol::OfferId.eq(offer_id))
        .exec(conn)
        .await?;

    if product_ids.is_empty() {
        return Ok(());
    }

    let rows = product_ids.iter().map(|product_id| OfferProductActive {
        offer_id: Set(offer_id),
        product_id: Set(*product_id),
    });
    OfferProducts::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup(vec![a, b, a, b, a]), vec![a, b]);
    }

    #[test]
    fn window_must_not_be_inverted() {
        let now = Utc::now();
        assert!(validate_window(now, now).is_ok());
        assert!(validate_window(now, now + chrono::Duration::days(1)).is_ok());
        assert!(validate_window(now + chrono::Duration::days(1), now).is_err());
    }
}
