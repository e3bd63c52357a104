use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::audit,
    dto::product_requests::{
        EditProductRequest, NewProductRequest, ProductRequestList, UpdateRequestStatus,
    },
    entity::{
        product_requests::{
            ActiveModel as RequestActive, Column as RequestCol, Entity as ProductRequests,
            Model as RequestModel,
        },
        sea_orm_active_enums::{NotificationKind, RequestStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::ProductRequest,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductRequestListQuery},
    services::notification_service,
    state::AppState,
};

/// A cancelled request is frozen.
pub fn ensure_open(status: RequestStatus) -> AppResult<()> {
    if status.is_terminal() {
        return Err(AppError::BadRequest("request is cancelled".into()));
    }
    Ok(())
}

/// Trimmed product name; blank names are rejected.
fn request_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("product name is required".into()));
    }
    Ok(name.to_string())
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<RequestModel> {
    ProductRequests::find_by_id(id)
        .filter(RequestCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn create_request(
    state: &AppState,
    user: &AuthUser,
    payload: NewProductRequest,
) -> AppResult<ApiResponse<ProductRequest>> {
    let name = request_name(&payload.name)?;
    let now = Utc::now();
    let request = RequestActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(name),
        quantity: Set(payload.quantity),
        notes: Set(payload.notes),
        request_status: Set(RequestStatus::Pending),
        admin_note: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    notification_service::emit(
        state,
        None,
        NotificationKind::ProductRequest,
        request.id,
        format!("New product request: {} x{}", request.name, request.quantity),
    )
    .await;

    Ok(ApiResponse::success(
        "Request created",
        ProductRequest::from(request),
        Some(Meta::empty()),
    ))
}

pub async fn list_mine(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductRequestList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = ProductRequests::find()
        .filter(RequestCol::UserId.eq(user.user_id))
        .order_by_desc(RequestCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductRequest::from)
        .collect();

    Ok(ApiResponse::success(
        "Requests",
        ProductRequestList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: EditProductRequest,
) -> AppResult<ApiResponse<ProductRequest>> {
    let existing = find_owned(state, user, id).await?;
    ensure_open(existing.request_status)?;

    let mut active: RequestActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(request_name(&name)?);
    }
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Request updated",
        ProductRequest::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn cancel_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductRequest>> {
    let existing = find_owned(state, user, id).await?;
    ensure_open(existing.request_status)?;

    let mut active: RequestActive = existing.into();
    active.request_status = Set(RequestStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    notification_service::emit(
        state,
        None,
        NotificationKind::ProductRequest,
        updated.id,
        format!("Product request for {} was cancelled", updated.name),
    )
    .await;

    Ok(ApiResponse::success(
        "Request cancelled",
        ProductRequest::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_all(
    state: &AppState,
    user: &AuthUser,
    query: ProductRequestListQuery,
) -> AppResult<ApiResponse<ProductRequestList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = ProductRequests::find().order_by_desc(RequestCol::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(RequestCol::RequestStatus.eq(status));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductRequest::from)
        .collect();

    Ok(ApiResponse::success(
        "Requests",
        ProductRequestList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRequestStatus,
) -> AppResult<ApiResponse<ProductRequest>> {
    ensure_admin(user)?;
    let existing = ProductRequests::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_open(existing.request_status)?;

    let requester = existing.user_id;
    let mut active: RequestActive = existing.into();
    active.request_status = Set(payload.status);
    if let Some(note) = payload.admin_note {
        active.admin_note = Set(Some(note));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(request_id = %id, status = payload.status.as_str(), "product request updated");
    notification_service::emit(
        state,
        Some(requester),
        NotificationKind::ProductRequest,
        id,
        format!(
            "Your request for {} is now {}",
            updated.name,
            payload.status.as_str()
        ),
    )
    .await;
    audit(
        state,
        user.user_id,
        "product_request_status",
        "product_requests",
        serde_json::json!({ "request_id": id, "status": payload.status.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Request updated",
        ProductRequest::from(updated),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancelled_requests_are_frozen() {
        assert!(ensure_open(RequestStatus::Pending).is_ok());
        assert!(ensure_open(RequestStatus::Available).is_ok());
        assert!(ensure_open(RequestStatus::NotAvailable).is_ok());
        assert!(matches!(
            ensure_open(RequestStatus::Cancelled),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn names_are_trimmed_and_must_not_be_blank() {
        assert_eq!(request_name("  Melatonin ").ok().as_deref(), Some("Melatonin"));
        assert!(matches!(request_name("   "), Err(AppError::BadRequest(_))));
        assert!(matches!(request_name(""), Err(AppError::BadRequest(_))));
    }
}
