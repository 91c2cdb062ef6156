//! Notification API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::auth::CallerIdentity;
use crate::core::ServerState;
use crate::db::models::Notification;
use crate::db::repository::NotificationRepository;
use crate::utils::{AppError, AppResult};

/// Query params for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/notifications - 调用方的通知，按时间倒序
pub async fn list(
    State(state): State<ServerState>,
    caller: CallerIdentity,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let repo = NotificationRepository::new(state.db.clone());
    let notifications = repo
        .find_for_user(&caller.user_id, query.limit.clamp(1, 200))
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(notifications))
}
