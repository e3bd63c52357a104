mod common;

use pharmacy_store_api::{
    dto::product_requests::{NewProductRequest, UpdateRequestStatus},
    entity::{
        notifications::{Column as NotifCol, Entity as Notifications},
        sea_orm_active_enums::{NotificationKind, RequestStatus, UserRole},
    },
    error::AppError,
    routes::params::NotificationQuery,
    services::{notification_service, product_request_service},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

// A customer's request lands in the admin inbox; the decision lands in the customer's.
#[tokio::test]
async fn admin_inbox_and_customer_inbox_stay_apart() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, UserRole::User).await?;
    let other = common::create_user(&state, UserRole::User).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;

    let request = product_request_service::create_request(
        &state,
        &customer,
        NewProductRequest {
            name: "Vitamin D3 drops".into(),
            quantity: 1,
            notes: None,
        },
    )
    .await?
    .data
    .expect("request");

    let inbox_row = Notifications::find()
        .filter(NotifCol::TargetId.eq(request.id))
        .filter(NotifCol::UserId.is_null())
        .one(&state.orm)
        .await?
        .expect("admin notification");
    assert_eq!(inbox_row.kind, NotificationKind::ProductRequest);

    let customer_view = notification_service::list_notifications(
        &state,
        &customer,
        NotificationQuery::default(),
    )
    .await?
    .data
    .expect("notifications");
    assert!(customer_view.items.is_empty());

    let peek = notification_service::mark_read(&state, &customer, inbox_row.id).await;
    assert!(matches!(peek, Err(AppError::NotFound)));

    let read = notification_service::mark_read(&state, &admin, inbox_row.id)
        .await?
        .data
        .expect("notification");
    assert!(read.is_read);

    product_request_service::update_status(
        &state,
        &admin,
        request.id,
        UpdateRequestStatus {
            status: RequestStatus::Available,
            admin_note: Some("Back in stock next week".into()),
        },
    )
    .await?;

    let customer_view = notification_service::list_notifications(
        &state,
        &customer,
        NotificationQuery {
            unread_only: Some(true),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("notifications");
    assert_eq!(customer_view.items.len(), 1);
    let mine = &customer_view.items[0];
    assert_eq!(mine.user_id, Some(customer.user_id));
    assert_eq!(mine.target_id, request.id);

    let unread = notification_service::unread_count(&state, &customer)
        .await?
        .data
        .expect("count");
    assert_eq!(unread.unread, 1);

    let stolen = notification_service::delete_notification(&state, &other, mine.id).await;
    assert!(matches!(stolen, Err(AppError::NotFound)));

    let marked = notification_service::mark_all_read(&state, &customer)
        .await?
        .data
        .expect("marked");
    assert_eq!(marked.updated, 1);
    let unread = notification_service::unread_count(&state, &customer)
        .await?
        .data
        .expect("count");
    assert_eq!(unread.unread, 0);

    notification_service::delete_notification(&state, &customer, mine.id).await?;
    let gone = notification_service::mark_read(&state, &customer, mine.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    Ok(())
}
