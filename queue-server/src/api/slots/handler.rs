//! Slot Listing API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CallerIdentity;
use crate::core::ServerState;
use crate::utils::time::{format_12h, now_local, parse_date};
use crate::utils::AppResult;

/// Sentinel "remaining" value reported under the unlimited capacity policy
const UNLIMITED_REMAINING: i64 = 999;

/// Query params for the slot listing
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub service_id: String,
    pub date: String,
}

/// One bookable time point on the wire
#[derive(Debug, Serialize)]
pub struct SlotView {
    /// 12-hour render, e.g. "9:30 AM"
    pub time: String,
    /// 24-hour render, e.g. "09:30:00"
    pub time_24h: String,
    pub available: bool,
    pub remaining: i64,
}

/// Settings echoed alongside the listing
#[derive(Debug, Serialize)]
pub struct SlotSettingsView {
    pub slot_duration: u32,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub slots: Vec<SlotView>,
    pub settings: SlotSettingsView,
}

/// GET /api/slots?service_id=..&date=.. - 查询某服务某日期的可预约时段
pub async fn list(
    State(state): State<ServerState>,
    _caller: CallerIdentity,
    Query(query): Query<SlotsQuery>,
) -> AppResult<Json<SlotsResponse>> {
    let date = parse_date(&query.date)?;
    let now = now_local(state.config.timezone);

    let offering = state
        .booking
        .available_slots(&query.service_id, date, now)
        .await?;

    let slots = offering
        .slots
        .into_iter()
        .map(|slot| SlotView {
            time: format_12h(slot.time),
            time_24h: slot.time.format("%H:%M:%S").to_string(),
            available: slot.available,
            remaining: slot.remaining.unwrap_or(UNLIMITED_REMAINING),
        })
        .collect();

    Ok(Json(SlotsResponse {
        slots,
        settings: SlotSettingsView {
            slot_duration: offering.slot_duration_minutes,
        },
    }))
}
