//! `SchedulerState` — the Ledger (§4.4): the engine's one piece of mutable
//! state, owned by the orchestrator and borrowed read-only by the Checker
//! and Scorer for the duration of a single candidate evaluation (§9,
//! "Shared mutable state").

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::domain::{
    ActivityId, ConstraintViolation, EquipmentId, LedgerInvariantError, SchedulingAttempt,
    SpecialistId, TimeSlot,
};

/// Day-level load classification derived from scheduled minutes (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadIntensity {
    Rest,
    Low,
    Medium,
    High,
}

impl LoadIntensity {
    pub fn from_minutes(minutes: u32) -> Self {
        match minutes {
            0 => LoadIntensity::Rest,
            m if m <= 60 => LoadIntensity::Low,
            m if m <= 180 => LoadIntensity::Medium,
            _ => LoadIntensity::High,
        }
    }
}

/// Aggregate counters surfaced at the end of a run (§4.4 `statistics()`).
/// Resource utilization is reported as a raw booking count per resource,
/// since the Ledger does not itself track the horizon length needed to
/// turn a count into an occupancy percentage.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub total_demand_instances: u32,
    pub successful_instances: u32,
    pub success_rate: f64,
    pub success_rate_by_priority: HashMap<u8, f64>,
    pub resilience_rate: f64,
    pub specialist_booking_counts: HashMap<SpecialistId, usize>,
    pub equipment_booking_counts: HashMap<EquipmentId, usize>,
}

/// The central mutable state of a scheduling run.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// `BTreeMap`, not `HashMap`: the date keys must iterate in
    /// chronological order so serialization (and the determinism
    /// property, §8.7) doesn't depend on `HashMap`'s per-instance random
    /// seed. Matches §4.4's `map<date, ordered-list<TimeSlot>>`.
    pub schedule: BTreeMap<NaiveDate, Vec<TimeSlot>>,
    pub specialist_bookings: HashMap<SpecialistId, Vec<TimeSlot>>,
    pub equipment_bookings: HashMap<EquipmentId, Vec<TimeSlot>>,
    pub activity_occurrences: HashMap<ActivityId, u32>,
    pub backup_activations: HashMap<ActivityId, Vec<TimeSlot>>,
    pub failures: HashMap<ActivityId, SchedulingAttempt>,
    pub weekly_patterns: HashMap<(ActivityId, u8), u32>,

    /// Per-activity demand-instance counts and priorities, recorded by the
    /// orchestrator as instances are generated; used only to compute
    /// `statistics()` denominators.
    instance_totals: HashMap<ActivityId, u32>,
    instance_priorities: HashMap<ActivityId, u8>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that one demand instance exists for `activity_id`, so that
    /// `statistics()` has a denominator to compare successful commits
    /// against. Called once per instance as the orchestrator expands
    /// demand (§4.1).
    pub fn record_demand_instance(&mut self, activity_id: &ActivityId, priority: u8) {
        *self.instance_totals.entry(activity_id.clone()).or_insert(0) += 1;
        self.instance_priorities.insert(activity_id.clone(), priority);
    }

    /// Appends a committed slot to every relevant index and updates the
    /// occurrence/backup/weekday-pattern counters (§4.4 `add_booking`).
    ///
    /// No constraint checking happens here — the Checker is the sole
    /// authority for legality (§4.2); this method only defends the one
    /// invariant the Checker could have missed (user-overlap), which it
    /// never should. A debug build panics immediately via `debug_assert!`
    /// so tests surface a stack trace at the point of the bug; a release
    /// build returns the typed error instead of silently corrupting state.
    pub fn add_booking(&mut self, slot: TimeSlot) -> Result<(), LedgerInvariantError> {
        let day = self.schedule.entry(slot.date).or_default();
        let overlaps_existing = day.iter().any(|existing| {
            slot.effective_start() < existing.end_time() && existing.effective_start() < slot.end_time()
        });
        debug_assert!(
            !overlaps_existing,
            "commit of {} on {} would overlap an existing booking",
            slot.activity_id, slot.date
        );
        if overlaps_existing {
            return Err(LedgerInvariantError::UserOverlap {
                activity: slot.activity_id.clone(),
                date: slot.date,
            });
        }

        if slot.is_backup && slot.original_activity_id.is_none() {
            return Err(LedgerInvariantError::MissingOriginalActivityId {
                activity: slot.activity_id.clone(),
            });
        }

        let counter_key = slot.original_activity_id.clone().unwrap_or_else(|| slot.activity_id.clone());

        let day = self.schedule.entry(slot.date).or_default();
        let insert_at = day.partition_point(|s| s.start_time <= slot.start_time);
        day.insert(insert_at, slot.clone());

        if let Some(specialist_id) = &slot.specialist_id {
            self.specialist_bookings
                .entry(specialist_id.clone())
                .or_default()
                .push(slot.clone());
        }
        for equipment_id in &slot.equipment_ids {
            self.equipment_bookings
                .entry(equipment_id.clone())
                .or_default()
                .push(slot.clone());
        }

        *self.activity_occurrences.entry(counter_key.clone()).or_insert(0) += 1;

        if slot.is_backup {
            self.backup_activations.entry(counter_key).or_default().push(slot.clone());
        }

        let weekday = slot.date.weekday().num_days_from_monday() as u8;
        *self
            .weekly_patterns
            .entry((slot.activity_id.clone(), weekday))
            .or_insert(0) += 1;

        Ok(())
    }

    /// Upserts the `SchedulingAttempt` for `activity_id`, keeping the most
    /// recent violation kind and a running count across every candidate
    /// tried (§4.4 `record_failure`).
    pub fn record_failure(&mut self, activity_id: &ActivityId, violation: ConstraintViolation) {
        self.failures
            .entry(activity_id.clone())
            .and_modify(|attempt| attempt.record(violation.clone()))
            .or_insert_with(|| SchedulingAttempt::first(violation));
    }

    pub fn get_slots_for_date(&self, date: NaiveDate) -> &[TimeSlot] {
        self.schedule.get(&date).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn get_occurrence_count(&self, activity_id: &ActivityId) -> u32 {
        self.activity_occurrences.get(activity_id).copied().unwrap_or(0)
    }

    pub fn get_weekday_pattern_count(&self, activity_id: &ActivityId, weekday: u8) -> u32 {
        self.weekly_patterns
            .get(&(activity_id.clone(), weekday))
            .copied()
            .unwrap_or(0)
    }

    pub fn specialist_overlap_count(
        &self,
        specialist_id: &SpecialistId,
        date: NaiveDate,
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    ) -> usize {
        self.specialist_bookings
            .get(specialist_id)
            .map(|bookings| {
                bookings
                    .iter()
                    .filter(|b| b.date == date && b.start_time < end && start < b.end_time())
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn equipment_overlap_count(
        &self,
        equipment_id: &EquipmentId,
        date: NaiveDate,
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    ) -> usize {
        self.equipment_bookings
            .get(equipment_id)
            .map(|bookings| {
                bookings
                    .iter()
                    .filter(|b| b.date == date && b.start_time < end && start < b.end_time())
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn day_load_minutes(&self, date: NaiveDate) -> u32 {
        self.get_slots_for_date(date)
            .iter()
            .map(|s| s.duration_minutes)
            .sum()
    }

    /// Sum of durations on `date` for slots with `priority >= min_priority`
    /// (i.e. `min_priority` and everything less critical). This is the
    /// quantity the daily priority-capacity quota bounds (§4.1) — see
    /// `DESIGN.md` for why the tail is keyed on `>=` rather than `<=`.
    pub fn day_minutes_for_priority_at_least(&self, date: NaiveDate, min_priority: u8) -> u32 {
        self.get_slots_for_date(date)
            .iter()
            .filter(|s| s.priority >= min_priority)
            .map(|s| s.duration_minutes)
            .sum()
    }

    /// Activities with zero successful commits across the horizon (§4.4
    /// `failure_report`). Suppresses transient Tier-1 failures that a
    /// later tier rescued.
    pub fn failure_report(&self) -> HashMap<ActivityId, SchedulingAttempt> {
        self.failures
            .iter()
            .filter(|(activity_id, _)| self.get_occurrence_count(activity_id) == 0)
            .map(|(id, attempt)| (id.clone(), attempt.clone()))
            .collect()
    }

    pub fn statistics(&self) -> Statistics {
        let mut success_counts_by_priority: HashMap<u8, u32> = HashMap::new();
        let mut total_counts_by_priority: HashMap<u8, u32> = HashMap::new();

        let mut total_instances = 0u32;
        let mut total_successful = 0u32;

        for (activity_id, total) in &self.instance_totals {
            let priority = self.instance_priorities.get(activity_id).copied().unwrap_or(5);
            let successful = self.get_occurrence_count(activity_id).min(*total);
            total_instances += total;
            total_successful += successful;
            *total_counts_by_priority.entry(priority).or_insert(0) += total;
            *success_counts_by_priority.entry(priority).or_insert(0) += successful;
        }

        let success_rate = if total_instances == 0 {
            1.0
        } else {
            total_successful as f64 / total_instances as f64
        };

        let success_rate_by_priority = total_counts_by_priority
            .iter()
            .map(|(priority, total)| {
                let successful = success_counts_by_priority.get(priority).copied().unwrap_or(0);
                let rate = if *total == 0 { 1.0 } else { successful as f64 / *total as f64 };
                (*priority, rate)
            })
            .collect();

        let total_backup_commits: usize = self.backup_activations.values().map(|v| v.len()).sum();
        let total_commits: u32 = self.activity_occurrences.values().sum();
        let resilience_rate = if total_commits == 0 {
            0.0
        } else {
            total_backup_commits as f64 / total_commits as f64
        };

        let specialist_booking_counts = self
            .specialist_bookings
            .iter()
            .map(|(id, v)| (id.clone(), v.len()))
            .collect();
        let equipment_booking_counts = self
            .equipment_bookings
            .iter()
            .map(|(id, v)| (id.clone(), v.len()))
            .collect();

        Statistics {
            total_demand_instances: total_instances,
            successful_instances: total_successful,
            success_rate,
            success_rate_by_priority,
            resilience_rate,
            specialist_booking_counts,
            equipment_booking_counts,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityId, SlotStatus};
    use chrono::NaiveTime;

    fn slot(activity: &str, date: NaiveDate, start: NaiveTime, duration: u32) -> TimeSlot {
        TimeSlot {
            activity_id: ActivityId::from(activity),
            priority: 3,
            date,
            start_time: start,
            duration_minutes: duration,
            prep_minutes: 0,
            specialist_id: None,
            equipment_ids: vec![],
            is_backup: false,
            original_activity_id: None,
            status: SlotStatus::Scheduled,
        }
    }

    #[test]
    fn add_booking_updates_occurrence_and_weekday_counters() {
        let mut ledger = SchedulerState::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(); // Monday
        let s = slot("run", date, NaiveTime::from_hms_opt(7, 0, 0).unwrap(), 30);
        ledger.add_booking(s).unwrap();

        assert_eq!(ledger.get_occurrence_count(&ActivityId::from("run")), 1);
        assert_eq!(ledger.get_weekday_pattern_count(&ActivityId::from("run"), 0), 1);
        assert_eq!(ledger.get_slots_for_date(date).len(), 1);
    }

    #[test]
    fn add_booking_rejects_overlap() {
        let mut ledger = SchedulerState::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let a = slot("a", date, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 60);
        ledger.add_booking(a).unwrap();

        let b = slot("b", date, NaiveTime::from_hms_opt(9, 30, 0).unwrap(), 30);
        let result = ledger.add_booking(b);
        assert!(result.is_err());
    }

    #[test]
    fn backup_commit_counts_toward_primary_occurrence() {
        let mut ledger = SchedulerState::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut backup = slot("home_flow", date, NaiveTime::from_hms_opt(8, 0, 0).unwrap(), 30);
        backup.is_backup = true;
        backup.original_activity_id = Some(ActivityId::from("gym"));
        ledger.add_booking(backup).unwrap();

        assert_eq!(ledger.get_occurrence_count(&ActivityId::from("gym")), 1);
        assert_eq!(ledger.get_occurrence_count(&ActivityId::from("home_flow")), 0);
        assert_eq!(ledger.backup_activations[&ActivityId::from("gym")].len(), 1);
    }

    #[test]
    fn failure_report_excludes_activities_with_a_successful_commit() {
        let mut ledger = SchedulerState::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        ledger.record_failure(
            &ActivityId::from("rescued"),
            ConstraintViolation::Overlap {
                reason: "transient".into(),
                activity_id: ActivityId::from("rescued"),
                date,
            },
        );
        ledger.add_booking(slot("rescued", date, NaiveTime::from_hms_opt(7, 0, 0).unwrap(), 30))
            .unwrap();

        ledger.record_failure(
            &ActivityId::from("terminal"),
            ConstraintViolation::Exhaustion {
                reason: "no legal slot".into(),
                activity_id: ActivityId::from("terminal"),
                date,
            },
        );

        let report = ledger.failure_report();
        assert!(!report.contains_key(&ActivityId::from("rescued")));
        assert!(report.contains_key(&ActivityId::from("terminal")));
    }
}
