//! Booking engine integration tests against a throwaway embedded store
//! Run: cargo test -p queue-server --test booking_flow

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

use queue_server::booking::{
    BookingError, BookingService, CancellationPolicy, CapacityMode, LifecycleEvent,
    LifecycleEvents,
};
use queue_server::db::DbService;
use queue_server::db::models::{
    AppointmentSettingsPatch, NotificationKind, ServiceCreate, Ticket, TicketStatus,
};
use queue_server::db::repository::{
    AppointmentSettingsRepository, NotificationRepository, ServiceRepository, TicketRepository,
};

struct Harness {
    // keep the tempdir alive for the duration of the test
    _tmp: tempfile::TempDir,
    db: Surreal<Db>,
    events: Arc<LifecycleEvents>,
    booking: Arc<BookingService>,
}

async fn setup() -> Harness {
    setup_with(CancellationPolicy::Lenient, CapacityMode::Unlimited).await
}

async fn setup_with(cancellation: CancellationPolicy, capacity: CapacityMode) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let db = DbService::new(&tmp.path().join("queue.db")).await.unwrap().db;
    let events = Arc::new(LifecycleEvents::new());
    let booking = Arc::new(BookingService::new(
        db.clone(),
        cancellation,
        capacity,
        events.clone(),
    ));
    Harness {
        _tmp: tmp,
        db,
        events,
        booking,
    }
}

/// Seed an active service with default appointment settings; returns "service:xxx"
async fn seed_service(db: &Surreal<Db>, code: &str) -> String {
    let service = ServiceRepository::new(db.clone())
        .create(ServiceCreate {
            service_code: code.to_string(),
            service_name: format!("{} desk", code),
            description: None,
            estimated_minutes: Some(15),
        })
        .await
        .unwrap();
    let id = service.id.unwrap().to_string();
    AppointmentSettingsRepository::new(db.clone())
        .ensure_for_service(&id)
        .await
        .unwrap();
    id
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Fixed "now": 2026-03-02 08:00 local
fn now() -> NaiveDateTime {
    day(2).and_hms_opt(8, 0, 0).unwrap()
}

async fn ticket_count(db: &Surreal<Db>) -> i64 {
    let mut res = db
        .query("SELECT count() AS total FROM ticket GROUP ALL")
        .await
        .unwrap();
    let rows: Vec<serde_json::Value> = res.take(0).unwrap();
    rows.first()
        .and_then(|r| r["total"].as_i64())
        .unwrap_or(0)
}

async fn force_status(db: &Surreal<Db>, ticket: &Ticket, status: &str) {
    db.query("UPDATE $id SET status = $status")
        .bind(("id", ticket.id.clone().unwrap()))
        .bind(("status", status.to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();
}

// ========================================================================
// Booking happy path
// ========================================================================

#[tokio::test]
async fn booking_persists_ticket_and_confirmation() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;
    let mut rx = h.events.subscribe();

    let ticket = h
        .booking
        .book("user-1", &service, day(3), at(9, 30), now())
        .await
        .unwrap();

    assert_eq!(ticket.ticket_number, "GEN-001");
    assert_eq!(ticket.status, TicketStatus::Scheduled);
    assert!(ticket.is_appointment);
    assert_eq!(ticket.appointment_date, Some(day(3)));
    assert_eq!(ticket.appointment_time, Some(at(9, 30)));
    assert_eq!(ticket_count(&h.db).await, 1);

    // exactly one confirmation notification, referencing the ticket
    let notifications = NotificationRepository::new(h.db.clone())
        .find_for_ticket(&ticket.id_string())
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::AppointmentConfirmed);
    assert!(notifications[0].message.contains("GEN-001"));
    assert!(notifications[0].message.contains("March 3, 2026 at 9:30 AM"));

    // lifecycle event handed off to the sink
    let event = rx.try_recv().unwrap();
    assert!(matches!(event, LifecycleEvent::Scheduled { ticket_number, .. } if ticket_number == "GEN-001"));
}

#[tokio::test]
async fn active_appointment_tracks_booking_and_cancellation() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    assert!(h.booking.active_appointment("user-1").await.unwrap().is_none());

    let ticket = h
        .booking
        .book("user-1", &service, day(3), at(10, 0), now())
        .await
        .unwrap();

    let active = h.booking.active_appointment("user-1").await.unwrap().unwrap();
    assert_eq!(active.id_string(), ticket.id_string());

    h.booking
        .cancel("user-1", &ticket.id_string(), now())
        .await
        .unwrap();
    assert!(h.booking.active_appointment("user-1").await.unwrap().is_none());
}

// ========================================================================
// Single-active-ticket rule
// ========================================================================

#[tokio::test]
async fn second_booking_conflicts_until_first_is_cancelled() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    let first = h
        .booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap();

    // any service/date/time: still a conflict
    let err = h
        .booking
        .book("user-1", &service, day(4), at(14, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ActiveTicketExists));
    assert_eq!(ticket_count(&h.db).await, 1);

    h.booking
        .cancel("user-1", &first.id_string(), now())
        .await
        .unwrap();

    let second = h
        .booking
        .book("user-1", &service, day(4), at(14, 0), now())
        .await
        .unwrap();
    assert_eq!(second.ticket_number, "GEN-002");
}

#[tokio::test]
async fn active_walk_in_ticket_blocks_appointment() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    // walk-in ticket issued by the (external) queue path
    h.db.query(
        "CREATE ticket CONTENT {
            ticket_number: 'GEN-000',
            user_id: 'user-1',
            service: $service,
            is_appointment: false,
            auto_generated: false,
            status: 'waiting',
            reminder_sent: false,
            created_at: 0,
            updated_at: 0
        }",
    )
    .bind(("service", service.clone()))
    .await
    .unwrap()
    .check()
    .unwrap();

    let err = h
        .booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ActiveTicketExists));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_admit_exactly_one() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    let mut handles = Vec::new();
    for i in 0..6u32 {
        let booking = h.booking.clone();
        let service = service.clone();
        let slot = at(9 + i % 3, 30 * (i / 3) % 60);
        handles.push(tokio::spawn(async move {
            booking.book("user-1", &service, day(3), slot, now()).await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(BookingError::ActiveTicketExists) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 5);
    assert_eq!(ticket_count(&h.db).await, 1);
}

// ========================================================================
// Admission validation
// ========================================================================

#[tokio::test]
async fn admission_rejects_bad_dates_and_foreign_slots() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    // past date
    let err = h
        .booking
        .book("user-1", &service, day(1), at(9, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::PastDate));

    // beyond the 7-day default horizon
    let err = h
        .booking
        .book("user-1", &service, day(10), at(9, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::BeyondHorizon(7)));

    // not on a slot boundary
    let err = h
        .booking
        .book("user-1", &service, day(3), at(9, 15), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotNotOffered));

    // outside the operating window
    let err = h
        .booking
        .book("user-1", &service, day(3), at(17, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotNotOffered));

    // nothing persisted along the way
    assert_eq!(ticket_count(&h.db).await, 0);
}

#[tokio::test]
async fn disabled_or_missing_settings_refuse_booking() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    AppointmentSettingsRepository::new(h.db.clone())
        .update(
            &service,
            AppointmentSettingsPatch {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = h
        .booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Disabled));

    // a service with no settings row at all behaves identically
    let bare = ServiceRepository::new(h.db.clone())
        .create(ServiceCreate {
            service_code: "BARE".to_string(),
            service_name: "Bare desk".to_string(),
            description: None,
            estimated_minutes: None,
        })
        .await
        .unwrap();
    let err = h
        .booking
        .book("user-1", &bare.id.unwrap().to_string(), day(3), at(9, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Disabled));
}

#[tokio::test]
async fn unknown_service_fails_not_found() {
    let h = setup().await;
    let err = h
        .booking
        .book("user-1", "service:missing", day(3), at(9, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ServiceNotFound(_)));
}

// ========================================================================
// Cancellation preconditions
// ========================================================================

#[tokio::test]
async fn cancel_rejects_missing_and_foreign_tickets() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    let err = h
        .booking
        .cancel("user-1", "ticket:missing", now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::TicketNotFound));

    let ticket = h
        .booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap();

    // owned by someone else: indistinguishable from missing
    let err = h
        .booking
        .cancel("user-2", &ticket.id_string(), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::TicketNotFound));

    // the owner still can cancel
    h.booking
        .cancel("user-1", &ticket.id_string(), now())
        .await
        .unwrap();
}

#[tokio::test]
async fn cancel_rejects_every_non_scheduled_status() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    for (i, status) in ["waiting", "called", "serving", "completed"].iter().enumerate() {
        let user = format!("user-{i}");
        let ticket = h
            .booking
            .book(&user, &service, day(3), at(9, 0), now())
            .await
            .unwrap();
        force_status(&h.db, &ticket, status).await;

        let err = h
            .booking
            .cancel(&user, &ticket.id_string(), now())
            .await
            .unwrap_err();
        assert!(
            matches!(err, BookingError::InvalidState(_)),
            "expected InvalidState for {status}"
        );
    }
}

#[tokio::test]
async fn cancel_is_not_idempotent() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    let ticket = h
        .booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap();

    let cancelled = h
        .booking
        .cancel("user-1", &ticket.id_string(), now())
        .await
        .unwrap();
    assert_eq!(cancelled.status, TicketStatus::Cancelled);

    let notifications = NotificationRepository::new(h.db.clone())
        .find_for_ticket(&ticket.id_string())
        .await
        .unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[1].kind, NotificationKind::AppointmentCancelled);

    // second cancel must fail, not silently succeed
    let err = h
        .booking
        .cancel("user-1", &ticket.id_string(), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidState(TicketStatus::Cancelled)));
}

#[tokio::test]
async fn enforced_deadline_blocks_late_cancellation() {
    let h = setup_with(CancellationPolicy::EnforceDeadline, CapacityMode::Unlimited).await;
    let service = seed_service(&h.db, "GEN").await;

    // default deadline is 1h before the appointment
    let ticket = h
        .booking
        .book("user-1", &service, day(2), at(9, 0), day(2).and_hms_opt(7, 0, 0).unwrap())
        .await
        .unwrap();

    let err = h
        .booking
        .cancel("user-1", &ticket.id_string(), day(2).and_hms_opt(8, 30, 0).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::PastCancellationDeadline));

    // well before the deadline it still works
    h.booking
        .cancel("user-1", &ticket.id_string(), day(2).and_hms_opt(7, 30, 0).unwrap())
        .await
        .unwrap();
}

// ========================================================================
// Ticket numbering
// ========================================================================

#[tokio::test]
async fn ticket_numbers_grow_monotonically_past_the_padding() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    // push the counter to the padding edge
    h.db.query("UPSERT counter:ticket SET value = 999")
        .await
        .unwrap()
        .check()
        .unwrap();

    let ticket = h
        .booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap();
    assert_eq!(ticket.ticket_number, "GEN-1000");
}

// ========================================================================
// Atomicity
// ========================================================================

#[tokio::test]
async fn failed_transaction_leaves_no_partial_writes() {
    let h = setup().await;
    seed_service(&h.db, "GEN").await;
    assert_eq!(ticket_count(&h.db).await, 0);

    // simulate the notification append failing after the ticket insert
    let result = h
        .db
        .query("BEGIN TRANSACTION")
        .query(
            "CREATE ticket CONTENT {
                ticket_number: 'GEN-001',
                user_id: 'user-1',
                service: 'service:x',
                is_appointment: true,
                status: 'scheduled',
                reminder_sent: false,
                created_at: 0,
                updated_at: 0
            }",
        )
        .query("THROW 'notification append failed'")
        .query("COMMIT TRANSACTION")
        .await
        .unwrap()
        .check();

    assert!(result.is_err());
    // the whole unit of work rolled back
    assert_eq!(ticket_count(&h.db).await, 0);
}

// ========================================================================
// Capacity policy (enforced extension point)
// ========================================================================

#[tokio::test]
async fn enforced_capacity_closes_full_slots() {
    let h = setup_with(CancellationPolicy::Lenient, CapacityMode::Enforced).await;
    let service = seed_service(&h.db, "GEN").await;
    AppointmentSettingsRepository::new(h.db.clone())
        .update(
            &service,
            AppointmentSettingsPatch {
                slots_per_interval: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap();

    // same slot, different user: full
    let err = h
        .booking
        .book("user-2", &service, day(3), at(9, 0), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotFull));

    // the listing reflects it
    let offering = h
        .booking
        .available_slots(&service, day(3), now())
        .await
        .unwrap();
    let nine = offering
        .slots
        .iter()
        .find(|s| s.time == at(9, 0))
        .unwrap();
    assert!(!nine.available);
    assert_eq!(nine.remaining, Some(0));

    // the next slot is open
    let nine_thirty = offering
        .slots
        .iter()
        .find(|s| s.time == at(9, 30))
        .unwrap();
    assert!(nine_thirty.available);
    assert_eq!(nine_thirty.remaining, Some(1));

    h.booking
        .book("user-2", &service, day(3), at(9, 30), now())
        .await
        .unwrap();
}

#[tokio::test]
async fn unlimited_capacity_reports_every_slot_open() {
    let h = setup().await;
    let service = seed_service(&h.db, "GEN").await;

    h.booking
        .book("user-1", &service, day(3), at(9, 0), now())
        .await
        .unwrap();

    let offering = h
        .booking
        .available_slots(&service, day(3), now())
        .await
        .unwrap();

    assert_eq!(offering.slot_duration_minutes, 30);
    assert_eq!(offering.slots.len(), 16);
    assert!(offering.slots.iter().all(|s| s.available));
    assert!(offering.slots.iter().all(|s| s.remaining.is_none()));
}

// ========================================================================
// Bookable services listing
// ========================================================================

#[tokio::test]
async fn bookable_services_excludes_disabled_and_unconfigured() {
    let h = setup().await;
    let enabled = seed_service(&h.db, "GEN").await;
    let disabled = seed_service(&h.db, "OFF").await;
    AppointmentSettingsRepository::new(h.db.clone())
        .update(
            &disabled,
            AppointmentSettingsPatch {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    // active service with no settings row at all
    ServiceRepository::new(h.db.clone())
        .create(ServiceCreate {
            service_code: "BARE".to_string(),
            service_name: "Bare desk".to_string(),
            description: None,
            estimated_minutes: None,
        })
        .await
        .unwrap();

    let services = h.booking.bookable_services().await.unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].id.as_ref().unwrap().to_string(), enabled);
}
