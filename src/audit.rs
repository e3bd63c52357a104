use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    entity::audit_logs::ActiveModel as AuditActive, error::AppResult, state::AppState,
};

pub async fn record<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.to_string()),
        resource: Set(resource.map(str::to_string)),
        metadata: Set(metadata),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Best effort: a failed audit write is logged, never surfaced to the caller.
pub async fn audit(state: &AppState, user_id: Uuid, action: &str, resource: &str, metadata: Value) {
    if let Err(err) = record(&state.orm, Some(user_id), action, Some(resource), Some(metadata)).await {
        tracing::warn!(error = %err, action, resource, "audit log failed");
    }
}
