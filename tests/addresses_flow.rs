mod common;

use pharmacy_store_api::{
    dto::addresses::{CreateAddressRequest, UpdateAddressRequest},
    entity::sea_orm_active_enums::UserRole,
    error::AppError,
    services::address_service,
};

fn payload(city: &str, is_default: bool) -> CreateAddressRequest {
    CreateAddressRequest {
        full_name: "Sam Lee".into(),
        phone: "5550100300".into(),
        line1: "22 Elm Road".into(),
        line2: Some("Flat 4".into()),
        city: city.into(),
        state: "CA".into(),
        postal_code: "94016".into(),
        country: "US".into(),
        is_default,
    }
}

#[tokio::test]
async fn a_user_never_has_two_default_addresses() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, UserRole::User).await?;

    let first = address_service::create_address(&state, &user, payload("Oakland", false))
        .await?
        .data
        .expect("address");
    assert!(first.is_default);

    let second = address_service::create_address(&state, &user, payload("Fresno", true))
        .await?
        .data
        .expect("address");
    assert!(second.is_default);
    assert_eq!(address_service::count_defaults(&state.orm, user.user_id).await?, 1);

    address_service::set_default(&state, &user, first.id).await?;
    assert_eq!(address_service::count_defaults(&state.orm, user.user_id).await?, 1);
    let current = address_service::default_address(&state.orm, user.user_id)
        .await?
        .expect("default");
    assert_eq!(current.id, first.id);

    address_service::delete_address(&state, &user, first.id).await?;
    let promoted = address_service::default_address(&state.orm, user.user_id)
        .await?
        .expect("promoted default");
    assert_eq!(promoted.id, second.id);

    address_service::update_address(
        &state,
        &user,
        second.id,
        UpdateAddressRequest {
            is_default: Some(false),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(address_service::count_defaults(&state.orm, user.user_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn addresses_are_private() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let owner = common::create_user(&state, UserRole::User).await?;
    let stranger = common::create_user(&state, UserRole::User).await?;

    let address = address_service::create_address(&state, &owner, payload("Reno", false))
        .await?
        .data
        .expect("address");

    let peek = address_service::get_address(&state, &stranger, address.id).await;
    assert!(matches!(peek, Err(AppError::NotFound)));
    let delete = address_service::delete_address(&state, &stranger, address.id).await;
    assert!(matches!(delete, Err(AppError::NotFound)));

    Ok(())
}
