use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::offers::{CreateOfferRequest, OfferList, UpdateOfferRequest},
    error::AppResult,
    middleware::{auth::AuthUser, validate::ValidatedJson},
    models::Offer,
    response::ApiResponse,
    routes::params::OfferListQuery,
    services::offer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_offers).post(create_offer))
        .route("/active", get(list_active_offers))
        .route(
            "/{id}",
            get(get_offer).put(update_offer).delete(delete_offer),
        )
}

#[utoipa::path(
    get,
    path = "/api/offers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "active or inactive")
    ),
    responses(
        (status = 200, description = "All offers (admin only)", body = ApiResponse<OfferList>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Offers"
)]
pub async fn list_offers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OfferListQuery>,
) -> AppResult<Json<ApiResponse<OfferList>>> {
    let resp = offer_service::list_offers(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/offers/active",
    responses(
        (status = 200, description = "Offers running now", body = ApiResponse<OfferList>)
    ),
    security(()),
    tag = "Offers"
)]
pub async fn list_active_offers(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<OfferList>>> {
    let resp = offer_service::list_active_offers(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer with its products", body = ApiResponse<Offer>),
        (status = 404, description = "Offer not found")
    ),
    security(()),
    tag = "Offers"
)]
pub async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let resp = offer_service::get_offer(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/offers",
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Offer created", body = ApiResponse<Offer>),
        (status = 400, description = "Bad discount, window or product ids")
    ),
    tag = "Offers"
)]
pub async fn create_offer(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateOfferRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Offer>>)> {
    let resp = offer_service::create_offer(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/offers/{id}",
    params(("id" = Uuid, Path, description = "Offer ID")),
    request_body = UpdateOfferRequest,
    responses(
        (status = 200, description = "Offer updated", body = ApiResponse<Offer>),
        (status = 404, description = "Offer not found")
    ),
    tag = "Offers"
)]
pub async fn update_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateOfferRequest>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let resp = offer_service::update_offer(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/offers/{id}",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Offer not found")
    ),
    tag = "Offers"
)]
pub async fn delete_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = offer_service::delete_offer(&state, &user, id).await?;
    Ok(Json(resp))
}
