use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    dto::notifications::{MarkedRead, NotificationList, UnreadCount},
    entity::{
        notifications::{ActiveModel as NotificationActive, Column as NotifCol, Entity as Notifications},
        sea_orm_active_enums::NotificationKind,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Notification,
    response::{ApiResponse, Meta},
    routes::params::NotificationQuery,
    state::AppState,
};

/// Inserts a notification. `recipient = None` targets the admin inbox.
pub async fn notify<C: ConnectionTrait>(
    conn: &C,
    recipient: Option<Uuid>,
    kind: NotificationKind,
    target_id: Uuid,
    message: impl Into<String>,
) -> AppResult<()> {
    NotificationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(recipient),
        kind: Set(kind),
        target_id: Set(target_id),
        message: Set(message.into()),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Best-effort [`notify`]: the triggering operation has already succeeded.
pub async fn emit(
    state: &AppState,
    recipient: Option<Uuid>,
    kind: NotificationKind,
    target_id: Uuid,
    message: impl Into<String>,
) {
    if let Err(err) = notify(&state.orm, recipient, kind, target_id, message).await {
        tracing::warn!(error = %err, ?kind, %target_id, "notification failed");
    }
}

/// Rows visible to `user`: their own, plus the shared inbox for admins.
fn inbox(user: &AuthUser) -> Condition {
    let own = NotifCol::UserId.eq(user.user_id);
    if user.is_admin() {
        Condition::any().add(own).add(NotifCol::UserId.is_null())
    } else {
        Condition::all().add(own)
    }
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    query: NotificationQuery,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(inbox(user));
    if query.unread_only.unwrap_or(false) {
        condition = condition.add(NotifCol::IsRead.eq(false));
    }

    let finder = Notifications::find()
        .filter(condition)
        .order_by_desc(NotifCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();

    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn unread_count(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UnreadCount>> {
    let unread = Notifications::find()
        .filter(inbox(user))
        .filter(NotifCol::IsRead.eq(false))
        .count(&state.orm)
        .await? as i64;

    Ok(ApiResponse::success("Unread notifications", UnreadCount { unread }, None))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let existing = Notifications::find_by_id(id)
        .filter(inbox(user))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.is_read {
        return Ok(ApiResponse::success("Notification read", existing.into(), None));
    }

    let mut active: NotificationActive = existing.into();
    active.is_read = Set(true);
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Notification read", updated.into(), None))
}

pub async fn mark_all_read(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MarkedRead>> {
    let result = Notifications::update_many()
        .col_expr(NotifCol::IsRead, Expr::value(true))
        .filter(inbox(user))
        .filter(NotifCol::IsRead.eq(false))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Notifications read",
        MarkedRead {
            updated: result.rows_affected,
        },
        None,
    ))
}

pub async fn delete_notification(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Notifications::delete_many()
        .filter(NotifCol::Id.eq(id))
        .filter(inbox(user))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::done("Notification deleted"))
}
