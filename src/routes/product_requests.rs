use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::product_requests::{
        EditProductRequest, NewProductRequest, ProductRequestList, UpdateRequestStatus,
    },
    error::AppResult,
    middleware::{auth::AuthUser, validate::ValidatedJson},
    models::ProductRequest,
    response::ApiResponse,
    routes::params::{Pagination, ProductRequestListQuery},
    services::product_request_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_mine).post(create_request))
        .route("/{id}", put(update_request))
        .route("/{id}/cancel", post(cancel_request))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/{id}/status", patch(update_status))
}

#[utoipa::path(
    post,
    path = "/api/product-requests",
    request_body = NewProductRequest,
    responses(
        (status = 201, description = "Request created", body = ApiResponse<ProductRequest>),
        (status = 422, description = "Validation failed")
    ),
    tag = "Product requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<NewProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductRequest>>)> {
    let resp = product_request_service::create_request(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/product-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Caller's requests", body = ApiResponse<ProductRequestList>)
    ),
    tag = "Product requests"
)]
pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductRequestList>>> {
    let resp = product_request_service::list_mine(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/product-requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = EditProductRequest,
    responses(
        (status = 200, description = "Request updated", body = ApiResponse<ProductRequest>),
        (status = 400, description = "Request is cancelled"),
        (status = 404, description = "Request not found")
    ),
    tag = "Product requests"
)]
pub async fn update_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<EditProductRequest>,
) -> AppResult<Json<ApiResponse<ProductRequest>>> {
    let resp = product_request_service::update_request(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/product-requests/{id}/cancel",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = ApiResponse<ProductRequest>),
        (status = 400, description = "Already cancelled"),
        (status = 404, description = "Request not found")
    ),
    tag = "Product requests"
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductRequest>>> {
    let resp = product_request_service::cancel_request(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/product-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "pending, available, cancelled or not_available")
    ),
    responses(
        (status = 200, description = "All product requests", body = ApiResponse<ProductRequestList>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin"
)]
pub async fn list_all(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProductRequestListQuery>,
) -> AppResult<Json<ApiResponse<ProductRequestList>>> {
    let resp = product_request_service::list_all(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/product-requests/{id}/status",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = UpdateRequestStatus,
    responses(
        (status = 200, description = "Request status set", body = ApiResponse<ProductRequest>),
        (status = 400, description = "Request is cancelled"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Admin"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateRequestStatus>,
) -> AppResult<Json<ApiResponse<ProductRequest>>> {
    let resp = product_request_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
