use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::prescriptions::{PrescriptionList, ReviewPrescriptionRequest},
    error::AppResult,
    middleware::{auth::AuthUser, validate::ValidatedJson},
    models::Prescription,
    response::ApiResponse,
    routes::{
        params::{Pagination, PrescriptionListQuery},
        upload::{FileUpload, read_form},
        upload_limit,
    },
    services::prescription_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_mine)
                .post(upload_prescription)
                .layer(upload_limit()),
        )
        .route("/{id}", get(get_prescription))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/{id}/review", patch(review_prescription))
}

#[utoipa::path(
    post,
    path = "/api/prescriptions",
    request_body(content = FileUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Prescription uploaded, pending review", body = ApiResponse<Prescription>),
        (status = 400, description = "Missing, oversized or unsupported file")
    ),
    tag = "Prescriptions"
)]
pub async fn upload_prescription(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Prescription>>)> {
    let mut form = read_form(multipart).await?;
    let file = form.require_file()?;
    let notes = form.text("notes");
    let resp = prescription_service::upload_prescription(&state, &user, file, notes).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/prescriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Caller's prescriptions", body = ApiResponse<PrescriptionList>)
    ),
    tag = "Prescriptions"
)]
pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PrescriptionList>>> {
    let resp = prescription_service::list_mine(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/{id}",
    params(("id" = Uuid, Path, description = "Prescription ID")),
    responses(
        (status = 200, description = "Prescription", body = ApiResponse<Prescription>),
        (status = 404, description = "Not found or not the caller's")
    ),
    tag = "Prescriptions"
)]
pub async fn get_prescription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Prescription>>> {
    let resp = prescription_service::get_prescription(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/prescriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "pending, approved or rejected")
    ),
    responses(
        (status = 200, description = "All prescriptions, oldest first", body = ApiResponse<PrescriptionList>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin"
)]
pub async fn list_all(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PrescriptionListQuery>,
) -> AppResult<Json<ApiResponse<PrescriptionList>>> {
    let resp = prescription_service::list_all(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/prescriptions/{id}/review",
    params(("id" = Uuid, Path, description = "Prescription ID")),
    request_body = ReviewPrescriptionRequest,
    responses(
        (status = 200, description = "Prescription reviewed", body = ApiResponse<Prescription>),
        (status = 400, description = "Already reviewed"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin"
)]
pub async fn review_prescription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewPrescriptionRequest>,
) -> AppResult<Json<ApiResponse<Prescription>>> {
    let resp = prescription_service::review_prescription(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
