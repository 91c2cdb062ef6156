//! Notification Repository
//!
//! 核心视角下通知是只追加的；与工单变更同事务的写入路径在
//! [`TicketRepository`](super::TicketRepository) 中。这里提供读取面。

use super::{BaseRepository, RepoResult};
use crate::db::models::Notification;
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// A user's notifications, newest first
    pub async fn find_for_user(&self, user_id: &str, limit: i64) -> RepoResult<Vec<Notification>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM notification WHERE user_id = $user_id \
                 ORDER BY created_at DESC LIMIT $limit",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("limit", limit))
            .await?;
        let rows: Vec<Notification> = result.take(0)?;
        Ok(rows)
    }

    /// Notifications attached to a ticket, oldest first
    pub async fn find_for_ticket(&self, ticket_id: &str) -> RepoResult<Vec<Notification>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM notification WHERE ticket = $ticket \
                 ORDER BY created_at ASC",
            )
            .bind(("ticket", ticket_id.to_string()))
            .await?;
        let rows: Vec<Notification> = result.take(0)?;
        Ok(rows)
    }
}
