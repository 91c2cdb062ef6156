//! Reminder worker integration test
//! Run: cargo test -p queue-server --test reminder_worker

use chrono::{Duration, Utc};

use queue_server::booking::reminder;
use queue_server::core::{Config, ServerState};
use queue_server::db::models::NotificationKind;
use queue_server::db::repository::{AppointmentSettingsRepository, NotificationRepository};

#[tokio::test]
async fn sweep_reminds_due_tickets_exactly_once() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(tmp.path().to_string_lossy().to_string(), 0);
    let state = ServerState::initialize(&config).await.unwrap();

    // settings row carries the 30-minute default reminder lead
    let service = "service:reminder_test";
    AppointmentSettingsRepository::new(state.db.clone())
        .ensure_for_service(service)
        .await
        .unwrap();

    // a scheduled appointment 10 minutes from now: inside the lead window
    let soon = Utc::now().naive_utc() + Duration::minutes(10);
    state
        .db
        .query(
            "CREATE ticket CONTENT {
                ticket_number: 'GEN-001',
                user_id: 'user-1',
                service: $service,
                appointment_date: $date,
                appointment_time: $time,
                is_appointment: true,
                auto_generated: false,
                status: 'scheduled',
                reminder_sent: false,
                created_at: 0,
                updated_at: 0
            }",
        )
        .bind(("service", service.to_string()))
        .bind(("date", soon.date()))
        .bind(("time", soon.time()))
        .await
        .unwrap()
        .check()
        .unwrap();

    // one appointment far in the future: outside the window, untouched
    let later = Utc::now().naive_utc() + Duration::hours(6);
    state
        .db
        .query(
            "CREATE ticket CONTENT {
                ticket_number: 'GEN-002',
                user_id: 'user-2',
                service: $service,
                appointment_date: $date,
                appointment_time: $time,
                is_appointment: true,
                auto_generated: false,
                status: 'scheduled',
                reminder_sent: false,
                created_at: 0,
                updated_at: 0
            }",
        )
        .bind(("service", service.to_string()))
        .bind(("date", later.date()))
        .bind(("time", later.time()))
        .await
        .unwrap()
        .check()
        .unwrap();

    let sent = reminder::sweep(&state).await.unwrap();
    assert_eq!(sent, 1);

    let notifications = NotificationRepository::new(state.db.clone())
        .find_for_user("user-1", 10)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::AppointmentReminder);
    assert!(notifications[0].message.contains("GEN-001"));

    // flagged tickets are not reminded again
    let sent = reminder::sweep(&state).await.unwrap();
    assert_eq!(sent, 0);

    // the distant appointment got nothing
    let untouched = NotificationRepository::new(state.db.clone())
        .find_for_user("user-2", 10)
        .await
        .unwrap();
    assert!(untouched.is_empty());
}
