//! Service Listing API Handlers

use axum::{Json, extract::State};

use crate::auth::CallerIdentity;
use crate::core::ServerState;
use crate::db::models::Service;
use crate::utils::AppResult;

/// GET /api/services - 当前接受预约的服务列表
pub async fn list(
    State(state): State<ServerState>,
    _caller: CallerIdentity,
) -> AppResult<Json<Vec<Service>>> {
    let services = state.booking.bookable_services().await?;
    Ok(Json(services))
}
