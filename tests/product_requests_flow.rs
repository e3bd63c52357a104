mod common;

use pharmacy_store_api::{
    dto::product_requests::{EditProductRequest, NewProductRequest, UpdateRequestStatus},
    entity::sea_orm_active_enums::{RequestStatus, UserRole},
    error::AppError,
    services::product_request_service,
};

#[tokio::test]
async fn requests_freeze_once_cancelled() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, UserRole::User).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;

    let request = product_request_service::create_request(
        &state,
        &user,
        NewProductRequest {
            name: "  Melatonin 3mg ".into(),
            quantity: 2,
            notes: None,
        },
    )
    .await?
    .data
    .expect("request");
    assert_eq!(request.name, "Melatonin 3mg");
    assert_eq!(request.request_status, RequestStatus::Pending);

    let reviewed = product_request_service::update_status(
        &state,
        &admin,
        request.id,
        UpdateRequestStatus {
            status: RequestStatus::NotAvailable,
            admin_note: Some("Supplier out of stock".into()),
        },
    )
    .await?
    .data
    .expect("request");
    assert_eq!(reviewed.request_status, RequestStatus::NotAvailable);

    product_request_service::cancel_request(&state, &user, request.id).await?;

    let twice = product_request_service::cancel_request(&state, &user, request.id).await;
    assert!(matches!(twice, Err(AppError::BadRequest(_))));

    let edit = product_request_service::update_request(
        &state,
        &user,
        request.id,
        EditProductRequest {
            quantity: Some(5),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(edit, Err(AppError::BadRequest(_))));

    let reopen = product_request_service::update_status(
        &state,
        &admin,
        request.id,
        UpdateRequestStatus {
            status: RequestStatus::Available,
            admin_note: None,
        },
    )
    .await;
    assert!(matches!(reopen, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn only_admins_review_requests() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, UserRole::User).await?;

    let request = product_request_service::create_request(
        &state,
        &user,
        NewProductRequest {
            name: "Zinc lozenges".into(),
            quantity: 1,
            notes: Some("any brand".into()),
        },
    )
    .await?
    .data
    .expect("request");

    let result = product_request_service::update_status(
        &state,
        &user,
        request.id,
        UpdateRequestStatus {
            status: RequestStatus::Available,
            admin_note: None,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    Ok(())
}

#[tokio::test]
async fn blank_names_are_rejected_after_trimming() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, UserRole::User).await?;

    let blank = product_request_service::create_request(
        &state,
        &user,
        NewProductRequest {
            name: "   ".into(),
            quantity: 1,
            notes: None,
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    let request = product_request_service::create_request(
        &state,
        &user,
        NewProductRequest {
            name: "Cough syrup".into(),
            quantity: 1,
            notes: None,
        },
    )
    .await?
    .data
    .expect("request");

    let rename = product_request_service::update_request(
        &state,
        &user,
        request.id,
        EditProductRequest {
            name: Some("  ".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(rename, Err(AppError::BadRequest(_))));

    Ok(())
}
