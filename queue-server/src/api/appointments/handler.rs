//! Appointment API Handlers
//!
//! 写操作 (创建/取消) 遵守配置的请求截止时间：超时即中止工作单元，
//! 事务回滚，对外返回通用的不可用错误。

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::auth::CallerIdentity;
use crate::core::ServerState;
use crate::db::models::Ticket;
use crate::utils::time::{now_local, parse_date, parse_time};
use crate::utils::{AppError, AppResult};

/// Create appointment payload
#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub service_id: String,
    pub date: String,
    pub time: String,
}

/// Created appointment on the wire
#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub ticket_id: String,
    pub ticket_number: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// POST /api/appointments - 预约一个时段
pub async fn create(
    State(state): State<ServerState>,
    caller: CallerIdentity,
    Json(payload): Json<CreateAppointmentRequest>,
) -> AppResult<Json<AppointmentResponse>> {
    let date = parse_date(&payload.date)?;
    let time = parse_time(&payload.time)?;
    let now = now_local(state.config.timezone);

    let ticket = tokio::time::timeout(
        state.config.request_deadline(),
        state
            .booking
            .book(&caller.user_id, &payload.service_id, date, time, now),
    )
    .await
    .map_err(|_| AppError::unavailable("booking deadline exceeded"))??;

    Ok(Json(to_response(ticket)?))
}

/// GET /api/appointments/active - 当前活跃预约
pub async fn active(
    State(state): State<ServerState>,
    caller: CallerIdentity,
) -> AppResult<Json<Ticket>> {
    let ticket = state
        .booking
        .active_appointment(&caller.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("No active appointment"))?;
    Ok(Json(ticket))
}

/// POST /api/appointments/:id/cancel - 取消一个 scheduled 预约
pub async fn cancel(
    State(state): State<ServerState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> AppResult<Json<CancelResponse>> {
    let now = now_local(state.config.timezone);

    tokio::time::timeout(
        state.config.request_deadline(),
        state.booking.cancel(&caller.user_id, &id, now),
    )
    .await
    .map_err(|_| AppError::unavailable("cancellation deadline exceeded"))??;

    Ok(Json(CancelResponse { cancelled: true }))
}

fn to_response(ticket: Ticket) -> AppResult<AppointmentResponse> {
    // 预约工单的日期/时刻不变量由准入路径保证
    let (Some(date), Some(time)) = (ticket.appointment_date, ticket.appointment_time) else {
        return Err(AppError::internal("Appointment ticket without date/time"));
    };
    Ok(AppointmentResponse {
        ticket_id: ticket.id_string(),
        ticket_number: ticket.ticket_number,
        appointment_date: date,
        appointment_time: time,
    })
}
