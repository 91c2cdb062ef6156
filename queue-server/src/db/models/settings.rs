//! Appointment Settings Model
//!
//! 每个服务一条配置 (service 字段唯一索引)。
//! 服务激活时以默认值创建；之后仅由管理配置修改。

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Per-service appointment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSettings {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Owning service id, stored as "service:xxx" string
    pub service: String,
    pub enabled: bool,
    /// Maximum days ahead a slot may be booked (0 = today only)
    pub advance_booking_days: u32,
    pub slot_duration_minutes: u32,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    /// Capacity hint per slot; unenforced under the default policy
    pub slots_per_interval: u32,
    /// Reminder lead time before the appointment instant
    pub reminder_minutes: u32,
    pub allow_cancellation: bool,
    pub cancellation_deadline_hours: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AppointmentSettings {
    /// Default settings row for a newly activated service
    pub fn defaults_for(service_id: &str, now_millis: i64) -> Self {
        Self {
            id: None,
            service: service_id.to_string(),
            enabled: true,
            advance_booking_days: 7,
            slot_duration_minutes: 30,
            day_start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid constant time"),
            day_end: NaiveTime::from_hms_opt(17, 0, 0).expect("valid constant time"),
            slots_per_interval: 5,
            reminder_minutes: 30,
            allow_cancellation: true,
            cancellation_deadline_hours: 1,
            created_at: now_millis,
            updated_at: now_millis,
        }
    }
}

/// Partial update payload (administrative configuration)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_booking_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_start: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_end: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_per_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_cancellation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_deadline_hours: Option<u32>,
}
