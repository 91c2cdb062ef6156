//! Booking Admission Control
//!
//! `book` 的"查-后-写"序列必须对同一用户的并发预约免疫：两个并发请求
//! 不允许都观察到零活跃工单然后都落库。这里采用悲观策略 — 每用户一把
//! 异步互斥锁 (DashMap 注册表)，`book`/`cancel` 全程持有；工单与通知
//! 的成对写入再由存储事务保证原子性。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dashmap::DashMap;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::policy::{CancellationPolicy, CapacityMode, CapacityPolicy};
use super::slots::slot_window;
use super::{BookingError, LifecycleEvent, LifecycleEvents};
use crate::db::models::{
    AppointmentSettings, Notification, NotificationKind, Service, Ticket, TicketStatus,
};
use crate::db::repository::{
    AppointmentSettingsRepository, ServiceRepository, TicketRepository,
};
use crate::utils::time::{format_appointment, now_millis};

/// One offered slot with its availability under the active capacity policy
#[derive(Debug, Clone)]
pub struct SlotOffer {
    pub time: NaiveTime,
    pub available: bool,
    /// `None` means unlimited
    pub remaining: Option<i64>,
}

/// The slot listing for a service + date
#[derive(Debug, Clone)]
pub struct SlotOffering {
    pub slot_duration_minutes: u32,
    pub slots: Vec<SlotOffer>,
}

/// Render the human-facing ticket number
///
/// Zero-padded to at least 3 digits, unbounded beyond 999.
fn format_ticket_number(service_code: &str, sequence: i64) -> String {
    format!("{}-{:03}", service_code, sequence)
}

/// Booking admission controller and cancellation path
#[derive(Debug)]
pub struct BookingService {
    db: Surreal<Db>,
    /// Per-user serialization of check-then-act sequences
    user_locks: DashMap<String, Arc<Mutex<()>>>,
    cancellation_policy: CancellationPolicy,
    capacity_mode: CapacityMode,
    events: Arc<LifecycleEvents>,
}

impl BookingService {
    pub fn new(
        db: Surreal<Db>,
        cancellation_policy: CancellationPolicy,
        capacity_mode: CapacityMode,
        events: Arc<LifecycleEvents>,
    ) -> Self {
        Self {
            db,
            user_locks: DashMap::new(),
            cancellation_policy,
            capacity_mode,
            events,
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load a service or fail `ServiceNotFound` (inactive counts as gone)
    async fn require_service(&self, service_id: &str) -> Result<Service, BookingError> {
        let service = ServiceRepository::new(self.db.clone())
            .find_by_id(service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| BookingError::ServiceNotFound(service_id.to_string()))?;
        Ok(service)
    }

    /// Load settings fresh; absence is identical to appointments disabled
    async fn require_settings(
        &self,
        service_id: &str,
    ) -> Result<AppointmentSettings, BookingError> {
        AppointmentSettingsRepository::new(self.db.clone())
            .find_by_service(service_id)
            .await?
            .ok_or(BookingError::Disabled)
    }

    /// The slot listing for a service date (read-only, no booking state
    /// consulted under the default capacity policy)
    pub async fn available_slots(
        &self,
        service_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<SlotOffering, BookingError> {
        let service = self.require_service(service_id).await?;
        let canonical = service
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| service_id.to_string());

        let settings = self.require_settings(&canonical).await?;
        let times = slot_window(&settings, date, now)?;

        let policy = self.capacity_mode.policy_for(&settings);
        let booked: HashMap<NaiveTime, i64> = match policy {
            CapacityPolicy::Unlimited => HashMap::new(),
            CapacityPolicy::Bounded(_) => TicketRepository::new(self.db.clone())
                .count_booked_by_slot(&canonical, date)
                .await?
                .into_iter()
                .map(|row| (row.appointment_time, row.total))
                .collect(),
        };

        let slots = times
            .into_iter()
            .map(|time| {
                let taken = booked.get(&time).copied().unwrap_or(0);
                SlotOffer {
                    time,
                    available: policy.is_available(taken),
                    remaining: policy.remaining(taken),
                }
            })
            .collect();

        Ok(SlotOffering {
            slot_duration_minutes: settings.slot_duration_minutes,
            slots,
        })
    }

    /// Book an appointment slot
    ///
    /// Atomic unit of work: on success exactly one ticket and one
    /// notification exist; on any failure, neither does.
    pub async fn book(
        &self,
        user_id: &str,
        service_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Result<Ticket, BookingError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let tickets = TicketRepository::new(self.db.clone());

        // 1. Service and settings, read fresh for the admission decision
        let service = self.require_service(service_id).await?;
        let canonical = service
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| service_id.to_string());
        let settings = self.require_settings(&canonical).await?;

        // 2. The requested slot must be a member of the offered window
        let window = slot_window(&settings, date, now)?;
        if !window.contains(&time) {
            return Err(BookingError::SlotNotOffered);
        }

        // 2b. Capacity gate (no-op under the default Unlimited policy)
        let policy = self.capacity_mode.policy_for(&settings);
        if matches!(policy, CapacityPolicy::Bounded(_)) {
            let taken = tickets
                .count_booked_by_slot(&canonical, date)
                .await?
                .into_iter()
                .find(|row| row.appointment_time == time)
                .map(|row| row.total)
                .unwrap_or(0);
            if !policy.is_available(taken) {
                return Err(BookingError::SlotFull);
            }
        }

        // 3. Single active ticket per user, across appointments and walk-ins
        if tickets.count_active_for_user(user_id).await? > 0 {
            return Err(BookingError::ActiveTicketExists);
        }

        // 4. Sequence number and human-facing ticket number
        let sequence = tickets.next_sequence().await?;
        let ticket_number = format_ticket_number(&service.service_code, sequence);

        // 5. Transactional persist: ticket + confirmation notification
        let ticket_id = RecordId::from_table_key("ticket", format!("t{}", Uuid::new_v4().simple()));
        let created_at = now_millis();
        let ticket = Ticket {
            id: None,
            ticket_number: ticket_number.clone(),
            user_id: user_id.to_string(),
            service: canonical.clone(),
            appointment_date: Some(date),
            appointment_time: Some(time),
            is_appointment: true,
            auto_generated: false,
            status: TicketStatus::Scheduled,
            reminder_sent: false,
            created_at,
            updated_at: created_at,
        };
        let message = format!(
            "Your ticket has been scheduled for {}. Ticket: {}",
            format_appointment(date, time),
            ticket_number
        );
        let notification = Notification::new(
            user_id,
            ticket_id.to_string(),
            NotificationKind::AppointmentConfirmed,
            message,
            created_at,
        );

        let created = tickets
            .create_with_notification(&ticket_id, ticket, notification)
            .await?;

        tracing::info!(
            user = %user_id,
            ticket = %ticket_number,
            service = %canonical,
            "Appointment booked"
        );

        self.events.publish(LifecycleEvent::Scheduled {
            ticket_id: created.id_string(),
            ticket_number,
            user_id: user_id.to_string(),
            service: canonical,
        });

        Ok(created)
    }

    /// Cancel a scheduled appointment ticket
    ///
    /// Not idempotent by design: cancelling an already-cancelled ticket
    /// fails with `InvalidState`.
    pub async fn cancel(
        &self,
        user_id: &str,
        ticket_id: &str,
        now: NaiveDateTime,
    ) -> Result<Ticket, BookingError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let tickets = TicketRepository::new(self.db.clone());

        // 不存在与不属于调用方同样返回 NotFound
        let ticket = tickets
            .find_owned(ticket_id, user_id)
            .await?
            .filter(|t| t.is_appointment)
            .ok_or(BookingError::TicketNotFound)?;

        if !ticket.status.is_cancellable() {
            return Err(BookingError::InvalidState(ticket.status));
        }

        // Policy gate (no-op under the default Lenient policy)
        if let Some(settings) = AppointmentSettingsRepository::new(self.db.clone())
            .find_by_service(&ticket.service)
            .await?
            && let (Some(date), Some(time)) = (ticket.appointment_date, ticket.appointment_time)
        {
            self.cancellation_policy
                .check(&settings, date.and_time(time), now)?;
        }

        let id = ticket
            .id
            .clone()
            .ok_or_else(|| BookingError::Store(crate::db::repository::RepoError::Database(
                "Ticket row has no id".to_string(),
            )))?;

        let updated_at = now_millis();
        let notification = Notification::new(
            user_id,
            id.to_string(),
            NotificationKind::AppointmentCancelled,
            format!(
                "Your scheduled ticket {} has been cancelled.",
                ticket.ticket_number
            ),
            updated_at,
        );

        let updated = tickets
            .cancel_with_notification(&id, notification, updated_at)
            .await?;

        tracing::info!(user = %user_id, ticket = %updated.ticket_number, "Appointment cancelled");

        self.events.publish(LifecycleEvent::Cancelled {
            ticket_id: updated.id_string(),
            ticket_number: updated.ticket_number.clone(),
            user_id: user_id.to_string(),
        });

        Ok(updated)
    }

    /// The caller's current active appointment ticket, if any
    pub async fn active_appointment(
        &self,
        user_id: &str,
    ) -> Result<Option<Ticket>, BookingError> {
        Ok(TicketRepository::new(self.db.clone())
            .find_active_appointment(user_id)
            .await?)
    }

    /// Active services that currently accept appointments
    pub async fn bookable_services(&self) -> Result<Vec<Service>, BookingError> {
        let services = ServiceRepository::new(self.db.clone()).find_active().await?;
        let settings_repo = AppointmentSettingsRepository::new(self.db.clone());

        let mut bookable = Vec::with_capacity(services.len());
        for service in services {
            let Some(id) = service.id.as_ref().map(|id| id.to_string()) else {
                continue;
            };
            match settings_repo.find_by_service(&id).await? {
                Some(settings) if settings.enabled => bookable.push(service),
                _ => {}
            }
        }
        Ok(bookable)
    }
}
