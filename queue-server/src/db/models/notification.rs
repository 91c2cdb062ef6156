//! Notification Model
//!
//! 只追加、不可变；始终与其描述的工单变更同一事务写入。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Notification kinds emitted by the booking core
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentConfirmed,
    AppointmentCancelled,
    AppointmentReminder,
}

/// Immutable notification record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    pub user_id: String,
    /// Ticket id, stored as "ticket:xxx" string
    pub ticket: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: i64,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        ticket: impl Into<String>,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            ticket: ticket.into(),
            kind,
            message: message.into(),
            created_at,
        }
    }
}
