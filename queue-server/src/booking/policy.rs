//! Pluggable booking policies
//!
//! 容量与取消截止时间默认不强制执行 (配置字段仅作提示)；
//! 严格模式作为可选的扩展点，通过进程级配置切换。

use chrono::NaiveDateTime;

use super::BookingError;
use crate::db::models::AppointmentSettings;

/// Capacity enforcement mode (process-wide, from config)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityMode {
    /// Every slot reports as open (default)
    #[default]
    Unlimited,
    /// Enforce `slots_per_interval` from the service settings
    Enforced,
}

impl CapacityMode {
    /// Parse from config value; unknown names fall back to the default
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "enforced" | "bounded" => CapacityMode::Enforced,
            _ => CapacityMode::Unlimited,
        }
    }

    /// Resolve the per-service policy
    pub fn policy_for(&self, settings: &AppointmentSettings) -> CapacityPolicy {
        match self {
            CapacityMode::Unlimited => CapacityPolicy::Unlimited,
            CapacityMode::Enforced => CapacityPolicy::Bounded(settings.slots_per_interval),
        }
    }
}

/// Per-slot capacity policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    Unlimited,
    Bounded(u32),
}

impl CapacityPolicy {
    /// Remaining seats in a slot; `None` means unlimited
    pub fn remaining(&self, booked: i64) -> Option<i64> {
        match self {
            CapacityPolicy::Unlimited => None,
            CapacityPolicy::Bounded(max) => Some((i64::from(*max) - booked).max(0)),
        }
    }

    /// Whether another booking is admissible for a slot
    pub fn is_available(&self, booked: i64) -> bool {
        match self {
            CapacityPolicy::Unlimited => true,
            CapacityPolicy::Bounded(max) => booked < i64::from(*max),
        }
    }
}

/// Cancellation gating policy (process-wide, from config)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancellationPolicy {
    /// Never consult the deadline fields (default)
    #[default]
    Lenient,
    /// Honor `allow_cancellation` and `cancellation_deadline_hours`
    EnforceDeadline,
}

impl CancellationPolicy {
    /// Parse from config value; unknown names fall back to the default
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "enforced" | "deadline" => CancellationPolicy::EnforceDeadline,
            _ => CancellationPolicy::Lenient,
        }
    }

    /// Check whether a scheduled ticket may still be cancelled
    ///
    /// `appointment` is the local appointment instant, `now` the local
    /// current instant; both in the business timezone.
    pub fn check(
        &self,
        settings: &AppointmentSettings,
        appointment: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), BookingError> {
        match self {
            CancellationPolicy::Lenient => Ok(()),
            CancellationPolicy::EnforceDeadline => {
                if !settings.allow_cancellation {
                    return Err(BookingError::CancellationDisabled);
                }
                let deadline = appointment
                    - chrono::Duration::hours(i64::from(settings.cancellation_deadline_hours));
                if now > deadline {
                    return Err(BookingError::PastCancellationDeadline);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings() -> AppointmentSettings {
        let mut s = AppointmentSettings::defaults_for("service:test", 0);
        s.slots_per_interval = 2;
        s.cancellation_deadline_hours = 2;
        s
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn unlimited_capacity_always_admits() {
        let policy = CapacityMode::Unlimited.policy_for(&settings());
        assert_eq!(policy, CapacityPolicy::Unlimited);
        assert!(policy.is_available(10_000));
        assert_eq!(policy.remaining(10_000), None);
    }

    #[test]
    fn bounded_capacity_counts_down_and_closes() {
        let policy = CapacityMode::Enforced.policy_for(&settings());
        assert_eq!(policy, CapacityPolicy::Bounded(2));
        assert_eq!(policy.remaining(0), Some(2));
        assert_eq!(policy.remaining(1), Some(1));
        assert_eq!(policy.remaining(3), Some(0));
        assert!(policy.is_available(1));
        assert!(!policy.is_available(2));
    }

    #[test]
    fn lenient_cancellation_ignores_deadline() {
        let s = settings();
        // one minute before the appointment, deadline long past
        assert!(CancellationPolicy::Lenient
            .check(&s, at(14, 0), at(13, 59))
            .is_ok());
    }

    #[test]
    fn enforced_cancellation_honors_deadline() {
        let s = settings();
        let policy = CancellationPolicy::EnforceDeadline;
        // 3h before a 14:00 appointment with a 2h deadline: still fine
        assert!(policy.check(&s, at(14, 0), at(11, 0)).is_ok());
        // exactly at the deadline: still fine
        assert!(policy.check(&s, at(14, 0), at(12, 0)).is_ok());
        // past the deadline
        assert!(matches!(
            policy.check(&s, at(14, 0), at(12, 1)),
            Err(BookingError::PastCancellationDeadline)
        ));
    }

    #[test]
    fn enforced_cancellation_respects_allow_flag() {
        let mut s = settings();
        s.allow_cancellation = false;
        assert!(matches!(
            CancellationPolicy::EnforceDeadline.check(&s, at(14, 0), at(9, 0)),
            Err(BookingError::CancellationDisabled)
        ));
    }
}
