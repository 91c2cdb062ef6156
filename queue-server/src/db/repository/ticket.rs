//! Ticket Repository
//!
//! 工单表是唯一的共享可变资源。所有"工单 + 通知"成对写入都走单个
//! 存储事务 — 失败时零行落库，成功时恰好一张工单与一条通知。

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Notification, Ticket, TicketStatus};

/// Statuses that make a ticket count against the single-active-ticket rule
pub const ACTIVE_STATUSES: &str = "['scheduled', 'waiting', 'called', 'serving']";

#[derive(Debug, Deserialize)]
struct CountRow {
    total: i64,
}

#[derive(Debug, Deserialize)]
struct CounterRow {
    value: i64,
}

/// Per-slot active booking count (capacity enforcement input)
#[derive(Debug, Deserialize)]
pub struct SlotBookings {
    pub appointment_time: NaiveTime,
    pub total: i64,
}

#[derive(Clone)]
pub struct TicketRepository {
    base: BaseRepository,
}

impl TicketRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Advance the global ticket sequence atomically and return the new value
    ///
    /// `counter.value` 默认 0 (SCHEMAFULL DEFAULT)，首次调用返回 1。
    /// 失败的预约会烧掉一个序号 — 序列语义允许空洞。
    pub async fn next_sequence(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("UPSERT counter:ticket SET value += 1 RETURN AFTER")
            .await?;
        let rows: Vec<CounterRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|r| r.value)
            .ok_or_else(|| RepoError::Database("Ticket counter returned no row".to_string()))
    }

    /// Count the user's tickets in the active set (appointment AND walk-in)
    pub async fn count_active_for_user(&self, user_id: &str) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT count() AS total FROM ticket \
                 WHERE user_id = $user_id AND status IN {} GROUP ALL",
                ACTIVE_STATUSES
            ))
            .bind(("user_id", user_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.total).unwrap_or(0))
    }

    /// The user's current active appointment ticket, if any
    pub async fn find_active_appointment(&self, user_id: &str) -> RepoResult<Option<Ticket>> {
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT * FROM ticket \
                 WHERE user_id = $user_id AND is_appointment = true AND status IN {} \
                 ORDER BY created_at DESC LIMIT 1",
                ACTIVE_STATUSES
            ))
            .bind(("user_id", user_id.to_string()))
            .await?;
        let rows: Vec<Ticket> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Find ticket by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Ticket>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ticket ID: {}", id)))?;
        let ticket: Option<Ticket> = self.base.db().select(thing).await?;
        Ok(ticket)
    }

    /// Find ticket by id, restricted to its owner
    ///
    /// 不区分"不存在"与"不属于调用方" — 二者都返回 None。
    pub async fn find_owned(&self, id: &str, user_id: &str) -> RepoResult<Option<Ticket>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ticket ID: {}", id)))?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM ticket WHERE id = $id AND user_id = $user_id LIMIT 1")
            .bind(("id", thing))
            .bind(("user_id", user_id.to_string()))
            .await?;
        let rows: Vec<Ticket> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Persist a ticket and its confirmation notification in one transaction
    ///
    /// 工单 id 由调用方预先生成 (见 [`BookingService`])，通知记录在同一
    /// 事务内引用它；任一语句失败则整体回滚。
    ///
    /// [`BookingService`]: crate::booking::BookingService
    pub async fn create_with_notification(
        &self,
        ticket_id: &RecordId,
        ticket: Ticket,
        notification: Notification,
    ) -> RepoResult<Ticket> {
        self.base
            .db()
            .query("BEGIN TRANSACTION")
            .query("CREATE $id CONTENT $ticket")
            .query("CREATE notification CONTENT $notification")
            .query("COMMIT TRANSACTION")
            .bind(("id", ticket_id.clone()))
            .bind(("ticket", ticket))
            .bind(("notification", notification))
            .await?
            .check()?;

        self.find_by_id(&ticket_id.to_string())
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create ticket".to_string()))
    }

    /// Cancel a ticket and append the cancellation notification in one
    /// transaction; returns the updated ticket
    ///
    /// Precondition checks (existence, ownership, status) belong to the
    /// caller and run under the per-user lock.
    pub async fn cancel_with_notification(
        &self,
        ticket_id: &RecordId,
        notification: Notification,
        now_millis: i64,
    ) -> RepoResult<Ticket> {
        self.base
            .db()
            .query("BEGIN TRANSACTION")
            .query("UPDATE $id SET status = 'cancelled', updated_at = $now")
            .query("CREATE notification CONTENT $notification")
            .query("COMMIT TRANSACTION")
            .bind(("id", ticket_id.clone()))
            .bind(("now", now_millis))
            .bind(("notification", notification))
            .await?
            .check()?;

        self.find_by_id(&ticket_id.to_string())
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Ticket {} not found", ticket_id)))
    }

    /// Active booking counts per slot for a service + date (capacity input)
    pub async fn count_booked_by_slot(
        &self,
        service_id: &str,
        date: NaiveDate,
    ) -> RepoResult<Vec<SlotBookings>> {
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT appointment_time, count() AS total FROM ticket \
                 WHERE service = $service AND appointment_date = $date \
                 AND status IN {} GROUP BY appointment_time",
                ACTIVE_STATUSES
            ))
            .bind(("service", service_id.to_string()))
            .bind(("date", date))
            .await?;
        let rows: Vec<SlotBookings> = result.take(0)?;
        Ok(rows)
    }

    /// Scheduled appointment tickets that have not been reminded yet
    pub async fn find_unreminded_scheduled(&self) -> RepoResult<Vec<Ticket>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM ticket \
                 WHERE status = 'scheduled' AND is_appointment = true \
                 AND reminder_sent = false",
            )
            .await?;
        let rows: Vec<Ticket> = result.take(0)?;
        Ok(rows)
    }

    /// Flag a ticket as reminded and append the reminder notification
    /// in one transaction
    pub async fn mark_reminded_with_notification(
        &self,
        ticket_id: &RecordId,
        notification: Notification,
        now_millis: i64,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query("BEGIN TRANSACTION")
            .query("UPDATE $id SET reminder_sent = true, updated_at = $now")
            .query("CREATE notification CONTENT $notification")
            .query("COMMIT TRANSACTION")
            .bind(("id", ticket_id.clone()))
            .bind(("now", now_millis))
            .bind(("notification", notification))
            .await?
            .check()?;
        Ok(())
    }

    /// Current status of a ticket (read-only check for the queue-serving hand-off)
    pub async fn current_status(&self, id: &str) -> RepoResult<Option<TicketStatus>> {
        Ok(self.find_by_id(id).await?.map(|t| t.status))
    }
}
