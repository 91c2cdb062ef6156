//! Booking Core - 预约调度与工单生命周期
//!
//! # 组成
//!
//! - [`slots`] - 时段窗口生成 (纯函数，无副作用)
//! - [`admission`] - 预约准入控制 (单活跃工单规则、事务化落库)
//! - [`lifecycle`] - 工单状态机 (合法转换表、取消路径)
//! - [`policy`] - 可插拔策略 (容量、取消截止时间)
//! - [`reminder`] - 预约提醒后台扫描
//!
//! # 失败语义
//!
//! 所有前置校验在任何写入之前完成；事务内任一步失败则整个工作单元
//! 回滚，不存在可观察的部分写入。

pub mod admission;
pub mod lifecycle;
pub mod policy;
pub mod reminder;
pub mod slots;

pub use admission::BookingService;
pub use policy::{CancellationPolicy, CapacityMode, CapacityPolicy};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::db::models::TicketStatus;
use crate::db::repository::RepoError;
use crate::utils::AppError;

/// Booking domain errors
///
/// 映射到稳定的对外错误类别 (见 `From<BookingError> for AppError`)：
/// 校验类 → 400，冲突类 → 409，缺失类 → 404，状态机拒绝 → 422，
/// 存储故障 → 500。
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Appointments are not enabled for this service")]
    Disabled,

    #[error("Cannot book appointments in the past")]
    PastDate,

    #[error("Cannot book more than {0} days in advance")]
    BeyondHorizon(u32),

    #[error("Requested slot is not offered for this service")]
    SlotNotOffered,

    #[error("No capacity left in the requested slot")]
    SlotFull,

    #[error("You already have an active ticket. Please complete or cancel it first.")]
    ActiveTicketExists,

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Ticket not found or cannot be cancelled")]
    TicketNotFound,

    #[error("Ticket cannot be cancelled while {0}")]
    InvalidState(TicketStatus),

    #[error("Cancellation is not allowed for this service")]
    CancellationDisabled,

    #[error("Cancellation deadline has passed")]
    PastCancellationDeadline,

    #[error("Storage error: {0}")]
    Store(#[from] RepoError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match &err {
            BookingError::Disabled
            | BookingError::PastDate
            | BookingError::BeyondHorizon(_)
            | BookingError::SlotNotOffered => AppError::validation(err.to_string()),

            BookingError::SlotFull
            | BookingError::ActiveTicketExists
            | BookingError::CancellationDisabled
            | BookingError::PastCancellationDeadline => AppError::conflict(err.to_string()),

            BookingError::ServiceNotFound(_) | BookingError::TicketNotFound => {
                AppError::not_found(err.to_string())
            }

            BookingError::InvalidState(_) => AppError::invalid_state(err.to_string()),

            BookingError::Store(repo) => match repo {
                RepoError::NotFound(msg) => AppError::not_found(msg.clone()),
                RepoError::Duplicate(msg) => AppError::conflict(msg.clone()),
                RepoError::Validation(msg) => AppError::validation(msg.clone()),
                RepoError::Database(msg) => AppError::database(msg.clone()),
            },
        }
    }
}

/// Lifecycle events handed off to the notification sink
///
/// 仅作挂接点：事件丢失不影响核心正确性 (通知记录本身与工单同事务落库)。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Scheduled {
        ticket_id: String,
        ticket_number: String,
        user_id: String,
        service: String,
    },
    Cancelled {
        ticket_id: String,
        ticket_number: String,
        user_id: String,
    },
    ReminderSent {
        ticket_id: String,
        ticket_number: String,
        user_id: String,
    },
}

/// Broadcast hub for lifecycle events
#[derive(Debug)]
pub struct LifecycleEvents {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: LifecycleEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::new()
    }
}
