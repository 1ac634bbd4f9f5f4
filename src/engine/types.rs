//! Plain data types shared between the orchestrator, checker, and scorer,
//! but not part of the public domain model — they describe the engine's
//! own bookkeeping, not the user's input.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::ActivityId;

/// Which rung of the placement ladder (§4.1) a candidate is being tried
/// under. Carried on events and on `SchedulingAttempt` bookkeeping so
/// diagnostics can tell a rescued Tier-1 failure from a terminal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Primary,
    Backup,
    Liquid,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Backup => "backup",
            Tier::Liquid => "liquid",
        }
    }
}

/// A single unit of demand the orchestrator must try to place: "activity
/// X needs one occurrence somewhere in this window". Weekly/Monthly
/// activities expand to several instances; Daily expands to one per day.
#[derive(Debug, Clone)]
pub struct DemandInstance {
    pub activity_id: ActivityId,
    /// Inclusive window the *natural* (Tier 1) search is confined to.
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

impl DemandInstance {
    /// Sort key implementing §4.1's total order: ascending priority,
    /// ascending window start, ascending activity id. Priority is passed
    /// in by the caller (the orchestrator looks it up from the activity)
    /// rather than stored here, since it never changes and duplicating it
    /// per instance would invite drift.
    pub fn sort_key<'a>(&'a self, priority: u8) -> (u8, NaiveDate, &'a str) {
        (priority, self.window_start, self.activity_id.as_str())
    }
}

/// A candidate placement under evaluation: an activity, a specific date
/// and start time, and whether it is being tried as a backup.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub activity_id: ActivityId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub is_backup: bool,
    pub original_activity_id: Option<ActivityId>,
}
