//! Appointment Reminder Worker
//!
//! 定时扫描未提醒的 scheduled 预约工单；进入提醒窗口的工单在一个事务内
//! 追加提醒通知并打标。此任务失败绝不影响预约正确性。

use chrono::Duration;
use tokio_util::sync::CancellationToken;

use super::{BookingError, LifecycleEvent};
use crate::core::ServerState;
use crate::db::models::{Notification, NotificationKind};
use crate::db::repository::{AppointmentSettingsRepository, TicketRepository};
use crate::utils::time::{format_12h, now_local, now_millis};

/// Run the reminder loop until shutdown is signalled
pub async fn run(state: ServerState, shutdown: CancellationToken) {
    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(state.config.reminder_poll_secs));
    // 错过的 tick 不补发，直接顺延
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        poll_secs = state.config.reminder_poll_secs,
        "Appointment reminder worker started"
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Appointment reminder worker stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep(&state).await {
                    Ok(0) => {}
                    Ok(sent) => tracing::info!(sent, "Appointment reminders sent"),
                    Err(e) => tracing::warn!(error = %e, "Reminder sweep failed"),
                }
            }
        }
    }
}

/// One sweep: remind every due ticket, return how many were sent
pub async fn sweep(state: &ServerState) -> Result<u64, BookingError> {
    let tickets = TicketRepository::new(state.db.clone());
    let settings_repo = AppointmentSettingsRepository::new(state.db.clone());

    let now = now_local(state.config.timezone);
    let mut sent = 0u64;

    for ticket in tickets.find_unreminded_scheduled().await? {
        let (Some(date), Some(time)) = (ticket.appointment_date, ticket.appointment_time) else {
            continue;
        };
        let Some(id) = ticket.id.clone() else {
            continue;
        };

        let Some(settings) = settings_repo.find_by_service(&ticket.service).await? else {
            continue;
        };

        let appointment = date.and_time(time);
        let window_open = appointment - Duration::minutes(i64::from(settings.reminder_minutes));

        // 进入提醒窗口且预约尚未开始
        if now < window_open || now >= appointment {
            continue;
        }

        let notification = Notification::new(
            ticket.user_id.clone(),
            id.to_string(),
            NotificationKind::AppointmentReminder,
            format!(
                "Reminder: your appointment {} is coming up at {}.",
                ticket.ticket_number,
                format_12h(time)
            ),
            now_millis(),
        );

        tickets
            .mark_reminded_with_notification(&id, notification, now_millis())
            .await?;

        state.events.publish(LifecycleEvent::ReminderSent {
            ticket_id: ticket.id_string(),
            ticket_number: ticket.ticket_number.clone(),
            user_id: ticket.user_id.clone(),
        });

        sent += 1;
    }

    Ok(sent)
}
