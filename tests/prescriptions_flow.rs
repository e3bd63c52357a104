mod common;

use pharmacy_store_api::{
    dto::{
        cart::AddToCartRequest,
        orders::CheckoutRequest,
        prescriptions::ReviewPrescriptionRequest,
    },
    entity::sea_orm_active_enums::{PaymentMethod, PrescriptionStatus, UserRole},
    error::AppError,
    services::{address_service, cart_service, order_service, prescription_service},
    storage::Upload,
};

fn scan() -> Upload {
    Upload {
        file_name: "rx.pdf".into(),
        content_type: "application/pdf".into(),
        bytes: b"%PDF-1.4 test".to_vec(),
    }
}

fn review(status: PrescriptionStatus) -> ReviewPrescriptionRequest {
    ReviewPrescriptionRequest {
        status,
        review_note: Some("Checked with prescriber".into()),
    }
}

#[tokio::test]
async fn only_pending_prescriptions_are_reviewed() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, UserRole::User).await?;
    let stranger = common::create_user(&state, UserRole::User).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;

    let uploaded = prescription_service::upload_prescription(
        &state,
        &customer,
        scan(),
        Some("Amoxicillin course".into()),
    )
    .await?
    .data
    .expect("prescription");
    assert_eq!(uploaded.status, PrescriptionStatus::Pending);
    assert!(uploaded.file_url.starts_with("/uploads/prescriptions/"));

    let hidden = prescription_service::get_prescription(&state, &stranger, uploaded.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));
    prescription_service::get_prescription(&state, &admin, uploaded.id).await?;

    let self_review = prescription_service::review_prescription(
        &state,
        &customer,
        uploaded.id,
        review(PrescriptionStatus::Approved),
    )
    .await;
    assert!(matches!(self_review, Err(AppError::Forbidden)));

    let back_to_pending = prescription_service::review_prescription(
        &state,
        &admin,
        uploaded.id,
        review(PrescriptionStatus::Pending),
    )
    .await;
    assert!(matches!(back_to_pending, Err(AppError::BadRequest(_))));

    let approved = prescription_service::review_prescription(
        &state,
        &admin,
        uploaded.id,
        review(PrescriptionStatus::Approved),
    )
    .await?
    .data
    .expect("prescription");
    assert_eq!(approved.status, PrescriptionStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(admin.user_id));
    assert!(approved.reviewed_at.is_some());

    let second = prescription_service::review_prescription(
        &state,
        &admin,
        uploaded.id,
        review(PrescriptionStatus::Rejected),
    )
    .await;
    assert!(matches!(second, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn approved_prescription_unlocks_checkout() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, UserRole::User).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let product_id = common::create_product(&state, "30.00", 5, true).await?;
    address_service::create_address(&state, &customer, common::address_payload()).await?;

    let uploaded = prescription_service::upload_prescription(&state, &customer, scan(), None)
        .await?
        .data
        .expect("prescription");
    prescription_service::review_prescription(
        &state,
        &admin,
        uploaded.id,
        review(PrescriptionStatus::Approved),
    )
    .await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id,
            quantity: 1,
        },
    )
    .await?;
    let placed = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Cod,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(placed.order.total_amount, common::dec("30.00"));

    Ok(())
}
