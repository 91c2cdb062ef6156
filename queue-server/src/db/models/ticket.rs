//! Ticket Model
//!
//! 工单是系统唯一的共享可变资源；取消/完成后保留为历史记录，永不物理删除。

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Ticket status state machine states
///
/// `scheduled` (预约) 与 `waiting` (现场取号) 为初始状态；
/// `completed` / `cancelled` 为终止状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Scheduled,
    Waiting,
    Called,
    Serving,
    Completed,
    Cancelled,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TicketStatus::Scheduled => "scheduled",
            TicketStatus::Waiting => "waiting",
            TicketStatus::Called => "called",
            TicketStatus::Serving => "serving",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Ticket entity
///
/// Invariant: `is_appointment == true` ⇒ `appointment_date` and
/// `appointment_time` are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Human-facing code: "{service_code}-{seq}" (zero-padded to 3 digits)
    pub ticket_number: String,
    /// Pre-validated caller identity (explicit, never ambient)
    pub user_id: String,
    /// Owning service id, stored as "service:xxx" string
    pub service: String,
    #[serde(default)]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default)]
    pub appointment_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_appointment: bool,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub auto_generated: bool,
    pub status: TicketStatus,
    /// Set once the reminder notification has been appended
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub reminder_sent: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Ticket {
    /// Surface id as "ticket:xxx" string
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}
