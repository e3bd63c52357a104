mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use pharmacy_store_api::{
    entity::sea_orm_active_enums::UserRole, routes::create_app, services::auth_service,
};
use tower::ServiceExt;
use uuid::Uuid;

fn bearer(role: UserRole) -> String {
    let token = auth_service::issue_token(Uuid::new_v4(), role, common::TEST_SECRET, 1)
        .expect("token");
    format!("Bearer {token}")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_is_public() {
    let app = create_app(common::lazy_state());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn cart_requires_a_token() {
    let app = create_app(common::lazy_state());
    let response = app
        .oneshot(Request::get("/api/cart").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = create_app(common::lazy_state());
    let response = app
        .oneshot(
            Request::get("/api/orders")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_customers() {
    let app = create_app(common::lazy_state());
    let response = app
        .oneshot(
            Request::get("/api/admin/users")
                .header(header::AUTHORIZATION, bearer(UserRole::User))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reports_reject_customers_via_cookie() {
    let token = auth_service::issue_token(Uuid::new_v4(), UserRole::User, common::TEST_SECRET, 1)
        .expect("token");
    let app = create_app(common::lazy_state());
    let response = app
        .oneshot(
            Request::get("/api/admin/reports/summary")
                .header(header::COOKIE, format!("token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn register_validates_payload() {
    let app = create_app(common::lazy_state());
    let payload = serde_json::json!({
        "name": "Jane",
        "email": "not-an-email",
        "password": "long-enough-password"
    });
    let response = app
        .oneshot(
            Request::post("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn unknown_paths_get_the_json_envelope() {
    let app = create_app(common::lazy_state());
    let response = app
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["data"]["path"], "/api/nope");
}

#[tokio::test]
async fn docs_are_served() {
    let app = create_app(common::lazy_state());
    let response = app
        .oneshot(Request::get("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
