//! Plain value types for the scheduling domain: activities, the resources
//! they draw on, travel periods, and the bookings the engine produces.
//!
//! Activities/Specialists/Equipment/TravelPeriods are constructed once
//! before a run and treated as immutable for its duration; TimeSlots are
//! produced by `Ledger::add_booking` and never mutated afterward.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ids::{ActivityId, EquipmentId, SpecialistId, TravelPeriodId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Fitness,
    Food,
    Medication,
    Therapy,
    Consultation,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Home,
    Gym,
    Clinic,
    Outdoors,
    Any,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Location::Home => "home",
            Location::Gym => "gym",
            Location::Clinic => "clinic",
            Location::Outdoors => "outdoors",
            Location::Any => "any",
        };
        write!(f, "{}", s)
    }
}

/// Recurrence pattern for a demand-generating Activity.
///
/// `preferred_days` is advisory (not enforced as a hard constraint by the
/// engine) and currently unused by demand expansion; it is carried through
/// the domain model because the loader validates and stores it, and a
/// future scorer component could weight it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frequency {
    Daily {
        #[serde(default)]
        preferred_days: HashSet<u8>,
    },
    Weekly {
        count: u8,
        #[serde(default)]
        preferred_days: HashSet<u8>,
    },
    Monthly {
        count: u8,
        #[serde(default)]
        preferred_days: HashSet<u8>,
    },
}

/// A recurring demand the engine tries to place on the calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub activity_type: ActivityType,
    /// 1 = critical, 5 = optional.
    pub priority: u8,
    pub duration_minutes: u32,
    pub prep_minutes: u32,
    pub frequency: Frequency,
    pub specialist_id: Option<SpecialistId>,
    pub equipment_ids: Vec<EquipmentId>,
    pub location: Location,
    pub remote_capable: bool,
    pub time_window_start: Option<NaiveTime>,
    pub time_window_end: Option<NaiveTime>,
    pub backup_activity_ids: Vec<ActivityId>,
}

impl Activity {
    /// An activity is "effectively remote" if it declares itself remote
    /// capable, or if it requires at least one piece of equipment and
    /// every item it requires is portable. Used by the Checker's
    /// travel-context stage (§4.2 stage 1).
    ///
    /// An activity with an *empty* equipment list is deliberately not
    /// granted remoteness on portability grounds alone — "every required
    /// item is portable" is vacuously true when there are no required
    /// items, which would make every resource-free activity travel-proof
    /// regardless of `remote_capable` or `location`. See `DESIGN.md`.
    pub fn is_effectively_remote(&self, equipment_lookup: impl Fn(&EquipmentId) -> bool) -> bool {
        self.remote_capable
            || (!self.equipment_ids.is_empty() && self.equipment_ids.iter().all(|id| equipment_lookup(id)))
    }

    pub fn has_time_window(&self) -> bool {
        self.time_window_start.is_some() && self.time_window_end.is_some()
    }
}

/// A weekday + time-of-day window during which a Specialist can see clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// 0 = Monday .. 6 = Sunday, matching `chrono::Weekday::num_days_from_monday`.
    pub weekday: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialist {
    pub id: SpecialistId,
    pub specialist_type: String,
    pub availability: Vec<AvailabilityWindow>,
    pub blackout_dates: HashSet<NaiveDate>,
    pub max_concurrent_clients: u32,
}

/// An inclusive date range, used for equipment maintenance windows and
/// travel periods alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub location_label: String,
    pub is_portable: bool,
    pub maintenance_intervals: Vec<DateRange>,
    pub max_concurrent_users: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPeriod {
    pub id: TravelPeriodId,
    pub location_label: String,
    pub date_range: DateRange,
    pub remote_activities_only: bool,
    pub available_equipment_ids: Option<HashSet<EquipmentId>>,
}

impl TravelPeriod {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_range.contains(date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Scheduled,
}

/// A committed booking on the calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub activity_id: ActivityId,
    pub priority: u8,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub prep_minutes: u32,
    pub specialist_id: Option<SpecialistId>,
    pub equipment_ids: Vec<EquipmentId>,
    pub is_backup: bool,
    pub original_activity_id: Option<ActivityId>,
    pub status: SlotStatus,
}

impl TimeSlot {
    /// End of the slot's "own" interval, excluding prep time.
    pub fn end_time(&self) -> NaiveTime {
        self.start_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    /// `start - prep`. Used for effective-interval overlap checks (§4.2 stage 4).
    pub fn effective_start(&self) -> NaiveTime {
        self.start_time - chrono::Duration::minutes(self.prep_minutes as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn effectively_remote_when_flag_set() {
        let activity = Activity {
            id: ActivityId::from("a"),
            name: "Yoga".into(),
            activity_type: ActivityType::Fitness,
            priority: 3,
            duration_minutes: 30,
            prep_minutes: 0,
            frequency: Frequency::Daily {
                preferred_days: HashSet::new(),
            },
            specialist_id: None,
            equipment_ids: vec![],
            location: Location::Home,
            remote_capable: true,
            time_window_start: None,
            time_window_end: None,
            backup_activity_ids: vec![],
        };
        assert!(activity.is_effectively_remote(|_| false));
    }

    #[test]
    fn effectively_remote_when_all_equipment_portable() {
        let activity = Activity {
            id: ActivityId::from("a"),
            name: "Mat workout".into(),
            activity_type: ActivityType::Fitness,
            priority: 3,
            duration_minutes: 30,
            prep_minutes: 0,
            frequency: Frequency::Daily {
                preferred_days: HashSet::new(),
            },
            specialist_id: None,
            equipment_ids: vec![EquipmentId::from("mat")],
            location: Location::Home,
            remote_capable: false,
            time_window_start: None,
            time_window_end: None,
            backup_activity_ids: vec![],
        };
        assert!(activity.is_effectively_remote(|_| true));
        assert!(!activity.is_effectively_remote(|_| false));
    }

    #[test]
    fn time_slot_end_and_effective_start_account_for_prep() {
        let slot = TimeSlot {
            activity_id: ActivityId::from("a"),
            priority: 1,
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            start_time: naive_time(9, 30),
            duration_minutes: 60,
            prep_minutes: 15,
            specialist_id: None,
            equipment_ids: vec![],
            is_backup: false,
            original_activity_id: None,
            status: SlotStatus::Scheduled,
        };
        assert_eq!(slot.end_time(), naive_time(10, 30));
        assert_eq!(slot.effective_start(), naive_time(9, 15));
    }

    #[test]
    fn date_range_contains_is_inclusive() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()));
    }
}
