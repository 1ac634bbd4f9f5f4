//! Error and diagnostic-value types.
//!
//! Two families live here, deliberately kept apart (§7):
//!
//! - [`ValidationError`] and [`LedgerInvariantError`] are real `Error`
//!   impls (`thiserror`, mirroring the teacher's `domain::errors::DomainError`):
//!   they abort a run before or during execution.
//! - [`ConstraintViolation`] and [`SchedulingAttempt`] are plain data.
//!   They are never raised as exceptions; they are returned, stored, and
//!   reported on, the way the teacher's `scheduler_v2::events` module
//!   treats pipeline events as values rather than control flow.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{ActivityId, EquipmentId, SpecialistId};

/// Pre-run input validation failures (§7). Each aborts the run before any
/// scheduling is attempted; no partial `SchedulerState` is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("activity {activity} references unknown backup activity {backup}")]
    UnknownBackupActivity {
        activity: ActivityId,
        backup: ActivityId,
    },

    #[error("backup_activity_ids form a cycle starting at {activity}")]
    BackupCycle { activity: ActivityId },

    #[error("activity {activity} has priority {priority} outside 1..=5")]
    PriorityOutOfRange { activity: ActivityId, priority: u8 },

    #[error("activity {activity} has duration_minutes {duration} below the 10-minute minimum")]
    DurationTooShort { activity: ActivityId, duration: u32 },

    #[error("activity {activity} has prep_minutes {prep} outside 0..=60")]
    PrepOutOfRange { activity: ActivityId, prep: u32 },

    #[error("activity {activity} has a frequency count {count} outside the valid range")]
    FrequencyCountOutOfRange { activity: ActivityId, count: u8 },

    #[error("activity {activity} has time_window_start after time_window_end")]
    InvalidTimeWindow { activity: ActivityId },

    #[error("activity {activity} references unknown specialist {specialist}")]
    UnknownSpecialistReference {
        activity: ActivityId,
        specialist: SpecialistId,
    },

    #[error("activity {activity} references unknown equipment {equipment}")]
    UnknownEquipmentReference {
        activity: ActivityId,
        equipment: EquipmentId,
    },

    #[error("travel period {travel_period} has end date before start date")]
    InvalidTravelRange { travel_period: String },
}

/// A failed Ledger invariant (§7, "Invariants are assertions"). Reaching
/// this means the Checker let something through it should not have; it is
/// a programmer error, not a user-facing scheduling failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerInvariantError {
    #[error(
        "commit of activity {activity} on {date} would overlap an existing booking for the same user"
    )]
    UserOverlap { activity: ActivityId, date: NaiveDate },

    #[error("commit of activity {activity} on {date} exceeds specialist {specialist} capacity")]
    SpecialistOversubscribed {
        activity: ActivityId,
        specialist: SpecialistId,
        date: NaiveDate,
    },

    #[error("commit of activity {activity} on {date} exceeds equipment {equipment} capacity")]
    EquipmentOversubscribed {
        activity: ActivityId,
        equipment: EquipmentId,
        date: NaiveDate,
    },

    #[error("backup slot for activity {activity} is missing original_activity_id")]
    MissingOriginalActivityId { activity: ActivityId },
}

/// The kind of rule a candidate slot violated, per the Checker's
/// fail-fast pipeline (§4.2). The first stage to fail determines which
/// variant is produced; this is a contractual ordering relied on by
/// diagnostics and by tests asserting "first-failing-stage-wins".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintViolation {
    Travel { reason: String, activity_id: ActivityId, date: NaiveDate },
    Specialist { reason: String, activity_id: ActivityId, date: NaiveDate },
    Equipment { reason: String, activity_id: ActivityId, date: NaiveDate },
    Overlap { reason: String, activity_id: ActivityId, date: NaiveDate },
    TimeWindow { reason: String, activity_id: ActivityId, date: NaiveDate },
    Capacity { reason: String, activity_id: ActivityId, date: NaiveDate },
    Exhaustion { reason: String, activity_id: ActivityId, date: NaiveDate },
}

impl ConstraintViolation {
    pub fn activity_id(&self) -> &ActivityId {
        match self {
            ConstraintViolation::Travel { activity_id, .. }
            | ConstraintViolation::Specialist { activity_id, .. }
            | ConstraintViolation::Equipment { activity_id, .. }
            | ConstraintViolation::Overlap { activity_id, .. }
            | ConstraintViolation::TimeWindow { activity_id, .. }
            | ConstraintViolation::Capacity { activity_id, .. }
            | ConstraintViolation::Exhaustion { activity_id, .. } => activity_id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            ConstraintViolation::Travel { date, .. }
            | ConstraintViolation::Specialist { date, .. }
            | ConstraintViolation::Equipment { date, .. }
            | ConstraintViolation::Overlap { date, .. }
            | ConstraintViolation::TimeWindow { date, .. }
            | ConstraintViolation::Capacity { date, .. }
            | ConstraintViolation::Exhaustion { date, .. } => *date,
        }
    }

    /// Short tag used for reporting and for test assertions that only care
    /// about the kind, not the full reason string.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstraintViolation::Travel { .. } => "travel",
            ConstraintViolation::Specialist { .. } => "specialist",
            ConstraintViolation::Equipment { .. } => "equipment",
            ConstraintViolation::Overlap { .. } => "overlap",
            ConstraintViolation::TimeWindow { .. } => "time_window",
            ConstraintViolation::Capacity { .. } => "capacity",
            ConstraintViolation::Exhaustion { .. } => "exhaustion",
        }
    }
}

/// Per-activity-instance record of the last violation kind and cumulative
/// count seen across every candidate tried for that instance (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingAttempt {
    pub activity_id: ActivityId,
    pub last_violation: ConstraintViolation,
    pub attempt_count: u32,
}

impl SchedulingAttempt {
    pub fn first(violation: ConstraintViolation) -> Self {
        Self {
            activity_id: violation.activity_id().clone(),
            last_violation: violation,
            attempt_count: 1,
        }
    }

    pub fn record(&mut self, violation: ConstraintViolation) {
        self.last_violation = violation;
        self.attempt_count += 1;
    }
}
