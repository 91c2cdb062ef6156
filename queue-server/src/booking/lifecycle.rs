//! Ticket Lifecycle State Machine
//!
//! 完整合法转换表。本核心自己只做两件事：
//! 把新工单置入 `scheduled`，以及执行 `scheduled → cancelled`。
//! `scheduled → waiting → called → serving → completed` 的推进属于
//! 外部叫号子系统 — 此表即它实现时对照的契约。

use crate::db::models::TicketStatus;

impl TicketStatus {
    /// Statuses that count against the single-active-ticket rule
    pub const ACTIVE: [TicketStatus; 4] = [
        TicketStatus::Scheduled,
        TicketStatus::Waiting,
        TicketStatus::Called,
        TicketStatus::Serving,
    ];

    /// Whether a ticket in this status blocks a new booking
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Cancelled)
    }

    /// The legal transition table
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Scheduled, Waiting)
                | (Scheduled, Cancelled)
                | (Waiting, Called)
                | (Called, Serving)
                | (Serving, Completed)
        )
    }

    /// Whether the user-facing cancellation path applies
    ///
    /// 只有仍在 `scheduled` 的预约工单可以走取消路径；已进入现场队列
    /// (waiting 及之后) 的工单不可经此取消。
    pub fn is_cancellable(&self) -> bool {
        matches!(self, TicketStatus::Scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TicketStatus::*;

    const ALL: [TicketStatus; 6] = [Scheduled, Waiting, Called, Serving, Completed, Cancelled];

    #[test]
    fn active_set_matches_admission_rule() {
        assert!(Scheduled.is_active());
        assert!(Waiting.is_active());
        assert!(Called.is_active());
        assert!(Serving.is_active());
        assert!(!Completed.is_active());
        assert!(!Cancelled.is_active());
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for terminal in [Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn queue_progression_is_linear() {
        assert!(Scheduled.can_transition_to(Waiting));
        assert!(Waiting.can_transition_to(Called));
        assert!(Called.can_transition_to(Serving));
        assert!(Serving.can_transition_to(Completed));

        // no skipping ahead
        assert!(!Scheduled.can_transition_to(Called));
        assert!(!Waiting.can_transition_to(Serving));
        assert!(!Called.can_transition_to(Completed));
        // no going back
        assert!(!Called.can_transition_to(Waiting));
        assert!(!Serving.can_transition_to(Called));
    }

    #[test]
    fn only_scheduled_is_cancellable() {
        assert!(Scheduled.is_cancellable());
        assert!(Scheduled.can_transition_to(Cancelled));
        for status in [Waiting, Called, Serving, Completed, Cancelled] {
            assert!(!status.is_cancellable());
            assert!(!status.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&Scheduled).unwrap();
        assert_eq!(json, "\"scheduled\"");
        let back: TicketStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, Cancelled);
    }
}
