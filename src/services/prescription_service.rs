use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::audit,
    dto::prescriptions::{PrescriptionList, ReviewPrescriptionRequest},
    entity::{
        prescriptions::{ActiveModel as RxActive, Column as RxCol, Entity as Prescriptions},
        sea_orm_active_enums::{NotificationKind, PrescriptionStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Prescription,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, PrescriptionListQuery},
    services::notification_service,
    state::AppState,
    storage::{PRESCRIPTION_TYPES, Upload},
};

pub async fn upload_prescription(
    state: &AppState,
    user: &AuthUser,
    upload: Upload,
    notes: Option<String>,
) -> AppResult<ApiResponse<Prescription>> {
    let stored = state
        .uploads
        .save("prescriptions", &upload, PRESCRIPTION_TYPES)
        .await?;

    let now = Utc::now();
    let inserted = RxActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        file_url: Set(stored.url.clone()),
        file_name: Set(upload.file_name),
        content_type: Set(upload.content_type),
        notes: Set(notes.filter(|n| !n.trim().is_empty())),
        status: Set(PrescriptionStatus::Pending),
        review_note: Set(None),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await;

    let prescription = match inserted {
        Ok(p) => p,
        Err(err) => {
            state.uploads.remove(&stored.url).await;
            return Err(err.into());
        }
    };

    tracing::info!(prescription_id = %prescription.id, user_id = %user.user_id, "prescription uploaded");
    notification_service::emit(
        state,
        None,
        NotificationKind::Prescription,
        prescription.id,
        "New prescription awaiting review",
    )
    .await;
    audit(
        state,
        user.user_id,
        "prescription_upload",
        "prescriptions",
        serde_json::json!({ "prescription_id": prescription.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Prescription uploaded",
        Prescription::from(prescription),
        Some(Meta::empty()),
    ))
}

pub async fn list_mine(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PrescriptionList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Prescriptions::find()
        .filter(RxCol::UserId.eq(user.user_id))
        .order_by_desc(RxCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Prescription::from)
        .collect();

    Ok(ApiResponse::success(
        "Prescriptions",
        PrescriptionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Owners see their own prescriptions; admins see any.
pub async fn get_prescription(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Prescription>> {
    let mut finder = Prescriptions::find_by_id(id);
    if !user.is_admin() {
        finder = finder.filter(RxCol::UserId.eq(user.user_id));
    }
    let model = finder.one(&state.orm).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Prescription", Prescription::from(model), None))
}

pub async fn list_all(
    state: &AppState,
    user: &AuthUser,
    query: PrescriptionListQuery,
) -> AppResult<ApiResponse<PrescriptionList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Prescriptions::find().order_by_asc(RxCol::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(RxCol::Status.eq(status));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Prescription::from)
        .collect();

    Ok(ApiResponse::success(
        "Prescriptions",
        PrescriptionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn review_prescription(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReviewPrescriptionRequest,
) -> AppResult<ApiResponse<Prescription>> {
    ensure_admin(user)?;
    if payload.status == PrescriptionStatus::Pending {
        return Err(AppError::BadRequest(
            "review status must be approved or rejected".into(),
        ));
    }

    let existing = Prescriptions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status != PrescriptionStatus::Pending {
        return Err(AppError::BadRequest(format!(
            "prescription is already {}",
            existing.status.as_str()
        )));
    }

    let owner = existing.user_id;
    let now = Utc::now();
    let mut active: RxActive = existing.into();
    active.status = Set(payload.status);
    active.review_note = Set(payload.review_note);
    active.reviewed_by = Set(Some(user.user_id));
    active.reviewed_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(prescription_id = %id, status = payload.status.as_str(), "prescription reviewed");
    notification_service::emit(
        state,
        Some(owner),
        NotificationKind::Prescription,
        id,
        format!("Your prescription was {}", payload.status.as_str()),
    )
    .await;
    audit(
        state,
        user.user_id,
        "prescription_review",
        "prescriptions",
        serde_json::json!({ "prescription_id": id, "status": payload.status.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Prescription reviewed",
        Prescription::from(updated),
        Some(Meta::empty()),
    ))
}
