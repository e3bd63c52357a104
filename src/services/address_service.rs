use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    audit::audit,
    dto::addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
    entity::addresses::{ActiveModel as AddressActive, Column as AddrCol, Entity as Addresses, Model as AddressModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_addresses(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    let items: Vec<Address> = Addresses::find()
        .filter(AddrCol::UserId.eq(user.user_id))
        .order_by_desc(AddrCol::IsDefault)
        .order_by_desc(AddrCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Addresses",
        AddressList { items },
        Some(Meta::total(total)),
    ))
}

async fn find_owned<C: ConnectionTrait>(conn: &C, user: &AuthUser, id: Uuid) -> AppResult<AddressModel> {
    Addresses::find_by_id(id)
        .filter(AddrCol::UserId.eq(user.user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let model = find_owned(&state.orm, user, id).await?;
    Ok(ApiResponse::success("Address", Address::from(model), None))
}

/// The caller's default address, if they have one.
pub async fn default_address<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Option<AddressModel>> {
    Ok(Addresses::find()
        .filter(AddrCol::UserId.eq(user_id))
        .filter(AddrCol::IsDefault.eq(true))
        .one(conn)
        .await?)
}

/// Clears `is_default` on every address of `user_id` except `keep`.
async fn clear_default<C: ConnectionTrait>(conn: &C, user_id: Uuid, keep: Option<Uuid>) -> AppResult<()> {
    let mut update = Addresses::update_many()
        .col_expr(AddrCol::IsDefault, Expr::value(false))
        .col_expr(AddrCol::UpdatedAt, Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())))
        .filter(AddrCol::UserId.eq(user_id))
        .filter(AddrCol::IsDefault.eq(true));
    if let Some(id) = keep {
        update = update.filter(AddrCol::Id.ne(id));
    }
    update.exec(conn).await?;
    Ok(())
}

/// Serialises default-flag writes for one user by locking their address rows.
async fn lock_addresses<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Vec<AddressModel>> {
    Ok(Addresses::find()
        .filter(AddrCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .all(conn)
        .await?)
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = lock_addresses(&txn, user.user_id).await?;
    let is_default = payload.is_default || existing.is_empty();

    if is_default {
        clear_default(&txn, user.user_id, None).await?;
    }

    let now = Utc::now();
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        full_name: Set(payload.full_name),
        phone: Set(payload.phone),
        line1: Set(payload.line1),
        line2: Set(payload.line2),
        city: Set(payload.city),
        state: Set(payload.state),
        postal_code: Set(payload.postal_code),
        country: Set(payload.country),
        is_default: Set(is_default),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit(
        state,
        user.user_id,
        "address_create",
        "addresses",
        serde_json::json!({ "address_id": address.id, "is_default": is_default }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address created",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    lock_addresses(&txn, user.user_id).await?;
    let existing = find_owned(&txn, user, id).await?;
    let was_default = existing.is_default;

    let mut active: AddressActive = existing.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(line1) = payload.line1 {
        active.line1 = Set(line1);
    }
    if let Some(line2) = payload.line2 {
        active.line2 = Set(Some(line2));
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(region) = payload.state {
        active.state = Set(region);
    }
    if let Some(postal_code) = payload.postal_code {
        active.postal_code = Set(postal_code);
    }
    if let Some(country) = payload.country {
        active.country = Set(country);
    }
    match payload.is_default {
        Some(true) if !was_default => {
            clear_default(&txn, user.user_id, Some(id)).await?;
            active.is_default = Set(true);
        }
        Some(false) if was_default => {
            active.is_default = Set(false);
        }
        _ => {}
    }
    active.updated_at = Set(Utc::now().into());

    let address = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address updated",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn set_default(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    lock_addresses(&txn, user.user_id).await?;
    let existing = find_owned(&txn, user, id).await?;

    let address = if existing.is_default {
        existing
    } else {
        clear_default(&txn, user.user_id, Some(id)).await?;
        let mut active: AddressActive = existing.into();
        active.is_default = Set(true);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    };
    txn.commit().await?;

    tracing::debug!(user_id = %user.user_id, address_id = %id, "default address set");
    Ok(ApiResponse::success(
        "Default address set",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    lock_addresses(&txn, user.user_id).await?;
    let existing = find_owned(&txn, user, id).await?;

    Addresses::delete_by_id(existing.id).exec(&txn).await?;

    if existing.is_default {
        let newest = Addresses::find()
            .filter(AddrCol::UserId.eq(user.user_id))
            .order_by_desc(AddrCol::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(next) = newest {
            let mut active: AddressActive = next.into();
            active.is_default = Set(true);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?;
        }
    }
    txn.commit().await?;

    audit(
        state,
        user.user_id,
        "address_delete",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Address deleted"))
}

/// Number of default addresses a user has; at most one after any write.
pub async fn count_defaults<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<u64> {
    Ok(Addresses::find()
        .filter(AddrCol::UserId.eq(user_id))
        .filter(AddrCol::IsDefault.eq(true))
        .count(conn)
        .await?)
}
