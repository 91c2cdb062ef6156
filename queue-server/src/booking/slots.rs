//! Slot Window Generation
//!
//! 纯函数：只依赖配置、日期和 `now`，绝不读写预约状态。
//! 相同输入永远产出相同的严格递增时刻序列。

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::BookingError;
use crate::db::models::AppointmentSettings;

/// Generate the ordered, bookable time points for a service date
///
/// - `now` is the current instant in the business timezone; "today" and
///   the strictly-future truncation derive from it.
/// - The window is end-exclusive: the cursor steps by
///   `slot_duration_minutes` while strictly before `day_end`.
/// - For today, slots at or before `now` are dropped — a slot must lie
///   strictly in the future.
pub fn slot_window(
    settings: &AppointmentSettings,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Vec<NaiveTime>, BookingError> {
    if !settings.enabled {
        return Err(BookingError::Disabled);
    }

    let today = now.date();
    if date < today {
        return Err(BookingError::PastDate);
    }

    let horizon = today + Duration::days(i64::from(settings.advance_booking_days));
    if date > horizon {
        return Err(BookingError::BeyondHorizon(settings.advance_booking_days));
    }

    let step = Duration::minutes(i64::from(settings.slot_duration_minutes));
    let end = date.and_time(settings.day_end);
    let mut cursor = date.and_time(settings.day_start);
    let mut slots = Vec::new();

    while cursor < end {
        // 今天: 丢弃已到或已过的时刻
        if date > today || cursor > now {
            slots.push(cursor.time());
        }
        cursor += step;
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings() -> AppointmentSettings {
        AppointmentSettings::defaults_for("service:test", 0)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        d.and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn full_window_for_future_date() {
        let today = date(2026, 3, 2);
        let slots = slot_window(&settings(), date(2026, 3, 4), at(today, 8, 0)).unwrap();

        // 09:00..17:00 at 30min, end-exclusive: 16 slots
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0], NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(slots[1], NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(slots[15], NaiveTime::from_hms_opt(16, 30, 0).unwrap());
    }

    #[test]
    fn window_is_deterministic_and_ordered() {
        let today = date(2026, 3, 2);
        let a = slot_window(&settings(), date(2026, 3, 4), at(today, 8, 0)).unwrap();
        let b = slot_window(&settings(), date(2026, 3, 4), at(today, 8, 0)).unwrap();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn today_truncates_past_slots() {
        let today = date(2026, 3, 2);
        let slots = slot_window(&settings(), today, at(today, 10, 5)).unwrap();

        // 09:00..10:00 are gone; first offered slot is 10:30
        assert_eq!(slots[0], NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert_eq!(slots.len(), 13);
    }

    #[test]
    fn slot_equal_to_now_is_dropped() {
        let today = date(2026, 3, 2);
        let slots = slot_window(&settings(), today, at(today, 10, 0)).unwrap();

        // a slot at exactly `now` is not strictly in the future
        assert_eq!(slots[0], NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn disabled_settings_are_rejected() {
        let mut s = settings();
        s.enabled = false;
        let today = date(2026, 3, 2);
        assert!(matches!(
            slot_window(&s, date(2026, 3, 4), at(today, 8, 0)),
            Err(BookingError::Disabled)
        ));
    }

    #[test]
    fn past_date_is_rejected() {
        let today = date(2026, 3, 2);
        assert!(matches!(
            slot_window(&settings(), date(2026, 3, 1), at(today, 8, 0)),
            Err(BookingError::PastDate)
        ));
    }

    #[test]
    fn horizon_is_enforced_for_every_lead() {
        let today = date(2026, 3, 2);
        for days in [0u32, 1, 7, 30] {
            let mut s = settings();
            s.advance_booking_days = days;

            // last day inside the horizon is fine
            let edge = today + Duration::days(i64::from(days));
            assert!(slot_window(&s, edge, at(today, 8, 0)).is_ok());

            // one past the horizon fails
            let beyond = edge + Duration::days(1);
            assert!(matches!(
                slot_window(&s, beyond, at(today, 8, 0)),
                Err(BookingError::BeyondHorizon(d)) if d == days
            ));
        }
    }

    #[test]
    fn custom_duration_changes_step() {
        let mut s = settings();
        s.slot_duration_minutes = 45;
        let today = date(2026, 3, 2);
        let slots = slot_window(&s, date(2026, 3, 4), at(today, 8, 0)).unwrap();

        // 09:00, 09:45, ..., last one strictly before 17:00 => 16:30
        assert_eq!(slots[0], NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(slots[1], NaiveTime::from_hms_opt(9, 45, 0).unwrap());
        assert_eq!(*slots.last().unwrap(), NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert_eq!(slots.len(), 11);
    }

    #[test]
    fn empty_window_when_today_is_over() {
        let today = date(2026, 3, 2);
        let slots = slot_window(&settings(), today, at(today, 18, 0)).unwrap();
        assert!(slots.is_empty());
    }
}
