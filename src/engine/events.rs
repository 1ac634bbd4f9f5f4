//! Observability sink for the orchestrator (§11), grounded directly on the
//! teacher's `scheduler_v2::events` module: a trait decoupling event
//! emission from the logging backend, with a null, a logging, and a
//! collecting implementation.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveTime};

use crate::domain::{ActivityId, ConstraintViolation};
use crate::engine::types::Tier;

/// A structured record of one orchestrator decision. Kept as plain data
/// (not formatted strings) so a `CollectingEventSink` can assert on
/// specific fields in tests.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    DemandInstanceStarted {
        activity_id: ActivityId,
        window_start: NaiveDate,
        window_end: NaiveDate,
    },
    TierAttempted {
        tier: Tier,
        activity_id: ActivityId,
        date: NaiveDate,
    },
    CandidateRejected {
        activity_id: ActivityId,
        date: NaiveDate,
        start_time: NaiveTime,
        violation: ConstraintViolation,
    },
    CandidateScored {
        activity_id: ActivityId,
        date: NaiveDate,
        start_time: NaiveTime,
        score: i32,
    },
    Committed {
        activity_id: ActivityId,
        date: NaiveDate,
        start_time: NaiveTime,
        is_backup: bool,
    },
    TierEscalated {
        from_tier: Tier,
        to_tier: Tier,
        activity_id: ActivityId,
    },
    Exhausted {
        activity_id: ActivityId,
    },
}

pub trait SchedulerEventSink {
    fn emit(&self, event: SchedulerEvent);
}

/// Zero-overhead sink for large horizons where event bookkeeping would
/// dominate the run.
pub struct NullEventSink;

impl SchedulerEventSink for NullEventSink {
    fn emit(&self, _event: SchedulerEvent) {}
}

/// Routes every event through `tracing::debug!`, mirroring the teacher's
/// `LoggingEventSink`.
pub struct LoggingEventSink;

impl SchedulerEventSink for LoggingEventSink {
    fn emit(&self, event: SchedulerEvent) {
        tracing::debug!(?event, "scheduler_event");
    }
}

/// Stores every event for test assertions (e.g. counting rescued Tier-1
/// attempts, per §4.1's failure-semantics clause).
#[derive(Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<SchedulerEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SchedulerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_committed(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SchedulerEvent::Committed { .. }))
            .count()
    }

    pub fn count_tier_escalations(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SchedulerEvent::TierEscalated { .. }))
            .count()
    }

    pub fn count_exhausted(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SchedulerEvent::Exhausted { .. }))
            .count()
    }
}

impl SchedulerEventSink for CollectingEventSink {
    fn emit(&self, event: SchedulerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_counts_committed_events() {
        let sink = CollectingEventSink::new();
        sink.emit(SchedulerEvent::Committed {
            activity_id: ActivityId::from("a"),
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            is_backup: false,
        });
        sink.emit(SchedulerEvent::Exhausted { activity_id: ActivityId::from("b") });

        assert_eq!(sink.count_committed(), 1);
        assert_eq!(sink.count_exhausted(), 1);
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn null_sink_accepts_events_without_storing_them() {
        let sink = NullEventSink;
        sink.emit(SchedulerEvent::Exhausted { activity_id: ActivityId::from("a") });
    }
}
