//! `AdaptiveScheduler` — the Orchestrator (§4.1): demand expansion, the
//! three-tier placement ladder, and the daily priority-capacity quota.
//! The single public entry point is [`run`].

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};

use crate::config::SchedulerConfig;
use crate::domain::{
    Activity, ActivityId, ConstraintViolation, Frequency, SlotStatus, TimeSlot, ValidationError,
};
use crate::engine::checker::ConstraintChecker;
use crate::engine::events::{NullEventSink, SchedulerEvent, SchedulerEventSink};
use crate::engine::ledger::SchedulerState;
use crate::engine::scorer::score_candidate;
use crate::engine::types::{DemandInstance, Tier};

/// Bundled inputs to a scheduling run (§6).
#[derive(Debug, Clone)]
pub struct SchedulerInputs {
    pub start_date: NaiveDate,
    pub horizon_days: u32,
    pub activities: Vec<Activity>,
    pub specialists: Vec<crate::domain::Specialist>,
    pub equipment: Vec<crate::domain::Equipment>,
    pub travel_periods: Vec<crate::domain::TravelPeriod>,
    pub config: SchedulerConfig,
}

/// Runs the scheduler with a `NullEventSink` (no observability overhead).
pub fn run(inputs: SchedulerInputs) -> Result<SchedulerState, ValidationError> {
    run_with_sink(inputs, &NullEventSink)
}

/// Runs the scheduler, routing every orchestrator decision through `sink`
/// (§11). Validates inputs first (§7); validation failures abort before
/// any scheduling is attempted and no partial state is produced.
#[tracing::instrument(skip(inputs, sink), fields(start_date = %inputs.start_date, horizon_days = inputs.horizon_days))]
pub fn run_with_sink(
    inputs: SchedulerInputs,
    sink: &dyn SchedulerEventSink,
) -> Result<SchedulerState, ValidationError> {
    validate_inputs(&inputs)?;

    let checker = ConstraintChecker::new(&inputs.specialists, &inputs.equipment, &inputs.travel_periods);
    let activity_lookup: HashMap<&ActivityId, &Activity> =
        inputs.activities.iter().map(|a| (&a.id, a)).collect();

    let mut ledger = SchedulerState::new();
    let mut instances = expand_demand(&inputs.activities, inputs.start_date, inputs.horizon_days);

    for instance in &instances {
        let activity = activity_lookup[&instance.activity_id];
        ledger.record_demand_instance(&instance.activity_id, activity.priority);
    }

    instances.sort_by(|a, b| {
        let priority_a = activity_lookup[&a.activity_id].priority;
        let priority_b = activity_lookup[&b.activity_id].priority;
        (priority_a, a.window_start, a.activity_id.as_str())
            .cmp(&(priority_b, b.window_start, b.activity_id.as_str()))
    });

    for instance in &instances {
        let activity = activity_lookup[&instance.activity_id];
        sink.emit(SchedulerEvent::DemandInstanceStarted {
            activity_id: activity.id.clone(),
            window_start: instance.window_start,
            window_end: instance.window_end,
        });

        if let Some(slot) = try_tier(
            activity,
            instance.window_start,
            instance.window_end,
            false,
            None,
            &mut ledger,
            &checker,
            &inputs.config,
            sink,
            Tier::Primary,
        ) {
            commit(&mut ledger, slot, sink);
            continue;
        }

        let mut placed_via_backup = false;
        for backup_id in &activity.backup_activity_ids {
            let Some(backup_activity) = activity_lookup.get(backup_id) else {
                continue;
            };
            sink.emit(SchedulerEvent::TierEscalated {
                from_tier: Tier::Primary,
                to_tier: Tier::Backup,
                activity_id: activity.id.clone(),
            });
            if let Some(slot) = try_tier(
                backup_activity,
                instance.window_start,
                instance.window_end,
                true,
                Some(activity.id.clone()),
                &mut ledger,
                &checker,
                &inputs.config,
                sink,
                Tier::Backup,
            ) {
                commit(&mut ledger, slot, sink);
                placed_via_backup = true;
                break;
            }
        }
        if placed_via_backup {
            continue;
        }

        if let Some((overflow_start, overflow_end)) = liquid_overflow_window(activity, instance) {
            sink.emit(SchedulerEvent::TierEscalated {
                from_tier: Tier::Backup,
                to_tier: Tier::Liquid,
                activity_id: activity.id.clone(),
            });
            if let Some(slot) = try_tier(
                activity,
                overflow_start,
                overflow_end,
                false,
                None,
                &mut ledger,
                &checker,
                &inputs.config,
                sink,
                Tier::Liquid,
            ) {
                commit(&mut ledger, slot, sink);
                continue;
            }
        }

        // Only synthesize a generic Exhaustion entry when no tier ever
        // produced a real violation to explain the miss (e.g. an empty
        // candidate list). When a concrete reason was already recorded
        // (Capacity, Travel, Specialist, ...), that reason is the more
        // useful terminal diagnostic and is left as the attempt's last
        // violation rather than being overwritten.
        if !ledger.failures.contains_key(&activity.id) {
            let violation = ConstraintViolation::Exhaustion {
                reason: "no legal slot found across the primary, backup, and liquid tiers".into(),
                activity_id: activity.id.clone(),
                date: instance.window_end,
            };
            ledger.record_failure(&activity.id, violation);
        }
        sink.emit(SchedulerEvent::Exhausted { activity_id: activity.id.clone() });
    }

    Ok(ledger)
}

fn commit(ledger: &mut SchedulerState, slot: TimeSlot, sink: &dyn SchedulerEventSink) {
    sink.emit(SchedulerEvent::Committed {
        activity_id: slot.activity_id.clone(),
        date: slot.date,
        start_time: slot.start_time,
        is_backup: slot.is_backup,
    });
    ledger
        .add_booking(slot)
        .expect("checker-validated candidates must satisfy ledger invariants");
}

/// Tries to place `activity` somewhere in `[window_start, window_end]`,
/// iterating days ascending and committing the top-scoring legal
/// candidate on the first day that has one (§4.1 placement ladder).
#[allow(clippy::too_many_arguments)]
fn try_tier(
    activity: &Activity,
    window_start: NaiveDate,
    window_end: NaiveDate,
    is_backup: bool,
    original_activity_id: Option<ActivityId>,
    ledger: &mut SchedulerState,
    checker: &ConstraintChecker,
    config: &SchedulerConfig,
    sink: &dyn SchedulerEventSink,
    tier: Tier,
) -> Option<TimeSlot> {
    let mut date = window_start;
    while date <= window_end {
        sink.emit(SchedulerEvent::TierAttempted { tier, activity_id: activity.id.clone(), date });

        if let Some(start_time) = best_candidate_for_day(activity, date, ledger, checker, config, is_backup, sink) {
            return Some(TimeSlot {
                activity_id: activity.id.clone(),
                priority: activity.priority,
                date,
                start_time,
                duration_minutes: activity.duration_minutes,
                prep_minutes: activity.prep_minutes,
                specialist_id: activity.specialist_id.clone(),
                equipment_ids: activity.equipment_ids.clone(),
                is_backup,
                original_activity_id: original_activity_id.clone(),
                status: SlotStatus::Scheduled,
            });
        }

        date += Duration::days(1);
    }
    None
}

/// Evaluates every candidate time on `date` and returns the start time of
/// the highest-scoring legal one, breaking ties by earliest start time /
/// enumeration order (the first candidate to reach the max score).
#[allow(clippy::too_many_arguments)]
fn best_candidate_for_day(
    activity: &Activity,
    date: NaiveDate,
    ledger: &mut SchedulerState,
    checker: &ConstraintChecker,
    config: &SchedulerConfig,
    is_backup: bool,
    sink: &dyn SchedulerEventSink,
) -> Option<NaiveTime> {
    let existing: Vec<TimeSlot> = ledger.get_slots_for_date(date).to_vec();
    let candidates = candidate_times(activity, &existing, config);

    let mut best: Option<(NaiveTime, i32)> = None;
    for start_time in candidates {
        if let Some(violation) = priority_capacity_violation(activity, date, ledger, config) {
            sink.emit(SchedulerEvent::CandidateRejected {
                activity_id: activity.id.clone(),
                date,
                start_time,
                violation: violation.clone(),
            });
            ledger.record_failure(&activity.id, violation);
            continue;
        }

        match checker.check(activity, date, start_time, is_backup, ledger) {
            Ok(()) => {
                let score = score_candidate(activity, date, start_time, ledger, &config.scorer_weights);
                sink.emit(SchedulerEvent::CandidateScored {
                    activity_id: activity.id.clone(),
                    date,
                    start_time,
                    score,
                });
                // Ties go to the earlier start time (§4.3): a later-enumerated
                // candidate only displaces the incumbent on a strictly higher
                // score, or an equal score with an earlier start.
                let better = match best {
                    None => true,
                    Some((best_start, best_score)) => {
                        score > best_score || (score == best_score && start_time < best_start)
                    }
                };
                if better {
                    best = Some((start_time, score));
                }
            }
            Err(violation) => {
                sink.emit(SchedulerEvent::CandidateRejected {
                    activity_id: activity.id.clone(),
                    date,
                    start_time,
                    violation: violation.clone(),
                });
                ledger.record_failure(&activity.id, violation);
            }
        }
    }

    best.map(|(start_time, _)| start_time)
}

/// Cheap pre-check for the daily priority-capacity quota (§4.1), run
/// before the Checker. Committing `activity` on `date` would add its
/// duration to every priority tail `p <= activity.priority`; reject if
/// any of those tails would exceed its cap.
fn priority_capacity_violation(
    activity: &Activity,
    date: NaiveDate,
    ledger: &SchedulerState,
    config: &SchedulerConfig,
) -> Option<ConstraintViolation> {
    for p in 1..=activity.priority {
        let cap_minutes = (config.priority_capacity_factors.factor_for(p) as f64 * 1440.0) as u32;
        let existing = ledger.day_minutes_for_priority_at_least(date, p);
        if existing + activity.duration_minutes > cap_minutes {
            return Some(ConstraintViolation::Capacity {
                reason: format!(
                    "committing would push priority>={p} minutes on {date} to {} past the {cap_minutes}-minute cap",
                    existing + activity.duration_minutes
                ),
                activity_id: activity.id.clone(),
                date,
            });
        }
    }
    None
}

/// Enumerates candidate start times for `activity` on a day with
/// `existing` bookings already committed (§4.1 "Candidate time
/// enumeration"). Order is preserved; duplicates are removed.
fn candidate_times(activity: &Activity, existing: &[TimeSlot], config: &SchedulerConfig) -> Vec<NaiveTime> {
    let mut times = Vec::new();

    if let (Some(window_start), Some(window_end)) =
        (activity.time_window_start, activity.time_window_end)
    {
        let last_start = window_end - Duration::minutes(activity.duration_minutes as i64);
        let mut t = window_start;
        while t <= last_start {
            times.push(t);
            t += Duration::minutes(config.candidate_step_minutes as i64);
        }
    } else {
        times.extend(config.anchor_times.iter().copied());
    }

    for slot in existing {
        times.push(slot.end_time());
        let needed_minutes = activity.duration_minutes as i64 + activity.prep_minutes as i64;
        let minutes_since_midnight = slot.start_time.num_seconds_from_midnight() as i64 / 60;
        if minutes_since_midnight >= needed_minutes {
            times.push(slot.start_time - Duration::minutes(needed_minutes));
        }
    }

    let mut seen = std::collections::HashSet::new();
    times.retain(|t| seen.insert(*t));
    times
}

/// Expands every Activity's `Frequency` into concrete demand instances
/// across `[start_date, start_date + horizon_days)` (§4.1 "Demand
/// expansion").
fn expand_demand(activities: &[Activity], start_date: NaiveDate, horizon_days: u32) -> Vec<DemandInstance> {
    let horizon_end = start_date + Duration::days(horizon_days as i64);
    let mut instances = Vec::new();

    for activity in activities {
        match &activity.frequency {
            Frequency::Daily { .. } => {
                let mut day = start_date;
                while day < horizon_end {
                    instances.push(DemandInstance {
                        activity_id: activity.id.clone(),
                        window_start: day,
                        window_end: day,
                    });
                    day += Duration::days(1);
                }
            }
            Frequency::Weekly { count, .. } => {
                for (week_start, week_end) in week_windows(start_date, horizon_end) {
                    for _ in 0..*count {
                        instances.push(DemandInstance {
                            activity_id: activity.id.clone(),
                            window_start: week_start,
                            window_end: week_end,
                        });
                    }
                }
            }
            Frequency::Monthly { count, .. } => {
                for (month_start, month_end) in month_windows(start_date, horizon_end) {
                    for _ in 0..*count {
                        instances.push(DemandInstance {
                            activity_id: activity.id.clone(),
                            window_start: month_start,
                            window_end: month_end,
                        });
                    }
                }
            }
        }
    }

    instances
}

/// ISO weeks (Monday-start) intersecting `[start_date, horizon_end)`,
/// each clipped to the horizon.
fn week_windows(start_date: NaiveDate, horizon_end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::new();
    let mut day = start_date;
    while day < horizon_end {
        let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
        let sunday = monday + Duration::days(6);
        let clipped_start = monday.max(start_date);
        let clipped_end = sunday.min(horizon_end - Duration::days(1));
        windows.push((clipped_start, clipped_end));
        day = sunday + Duration::days(1);
    }
    windows
}

/// Calendar months intersecting `[start_date, horizon_end)`, each clipped
/// to the horizon.
fn month_windows(start_date: NaiveDate, horizon_end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::new();
    let mut day = start_date;
    while day < horizon_end {
        let month_start = NaiveDate::from_ymd_opt(day.year(), day.month(), 1).unwrap();
        let month_end = last_day_of_month(day.year(), day.month());
        let clipped_start = month_start.max(start_date);
        let clipped_end = month_end.min(horizon_end - Duration::days(1));
        windows.push((clipped_start, clipped_end));
        day = month_end + Duration::days(1);
    }
    windows
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap() - Duration::days(1)
}

/// Tier 3's widened window: the next ISO week after a `Weekly` instance's
/// window, or the next calendar month after a `Monthly` instance's window
/// (§4.1 Tier 3; not available for `Daily`).
fn liquid_overflow_window(activity: &Activity, instance: &DemandInstance) -> Option<(NaiveDate, NaiveDate)> {
    match &activity.frequency {
        Frequency::Daily { .. } => None,
        Frequency::Weekly { .. } => {
            let next_start = instance.window_end + Duration::days(1);
            let next_end = next_start + Duration::days(6);
            Some((next_start, next_end))
        }
        Frequency::Monthly { .. } => {
            let next_day = instance.window_end + Duration::days(1);
            let next_start = NaiveDate::from_ymd_opt(next_day.year(), next_day.month(), 1).unwrap();
            let next_end = last_day_of_month(next_day.year(), next_day.month());
            Some((next_start, next_end))
        }
    }
}

/// Pre-run validation (§7). Aborts before any scheduling is attempted.
fn validate_inputs(inputs: &SchedulerInputs) -> Result<(), ValidationError> {
    use std::collections::HashSet;

    let activity_ids: HashSet<&ActivityId> = inputs.activities.iter().map(|a| &a.id).collect();
    let specialist_ids: HashSet<&crate::domain::SpecialistId> =
        inputs.specialists.iter().map(|s| &s.id).collect();
    let equipment_ids: HashSet<&crate::domain::EquipmentId> =
        inputs.equipment.iter().map(|e| &e.id).collect();

    for activity in &inputs.activities {
        if !(1..=5).contains(&activity.priority) {
            return Err(ValidationError::PriorityOutOfRange {
                activity: activity.id.clone(),
                priority: activity.priority,
            });
        }
        if activity.duration_minutes < 10 {
            return Err(ValidationError::DurationTooShort {
                activity: activity.id.clone(),
                duration: activity.duration_minutes,
            });
        }
        if activity.prep_minutes > 60 {
            return Err(ValidationError::PrepOutOfRange {
                activity: activity.id.clone(),
                prep: activity.prep_minutes,
            });
        }
        match &activity.frequency {
            Frequency::Weekly { count, .. } if !(1..=7).contains(count) => {
                return Err(ValidationError::FrequencyCountOutOfRange {
                    activity: activity.id.clone(),
                    count: *count,
                });
            }
            Frequency::Monthly { count, .. } if !(1..=31).contains(count) => {
                return Err(ValidationError::FrequencyCountOutOfRange {
                    activity: activity.id.clone(),
                    count: *count,
                });
            }
            _ => {}
        }
        if let (Some(start), Some(end)) = (activity.time_window_start, activity.time_window_end) {
            if start > end {
                return Err(ValidationError::InvalidTimeWindow { activity: activity.id.clone() });
            }
        }
        if let Some(specialist_id) = &activity.specialist_id {
            if !specialist_ids.contains(specialist_id) {
                return Err(ValidationError::UnknownSpecialistReference {
                    activity: activity.id.clone(),
                    specialist: specialist_id.clone(),
                });
            }
        }
        for equipment_id in &activity.equipment_ids {
            if !equipment_ids.contains(equipment_id) {
                return Err(ValidationError::UnknownEquipmentReference {
                    activity: activity.id.clone(),
                    equipment: equipment_id.clone(),
                });
            }
        }
        for backup_id in &activity.backup_activity_ids {
            if !activity_ids.contains(backup_id) {
                return Err(ValidationError::UnknownBackupActivity {
                    activity: activity.id.clone(),
                    backup: backup_id.clone(),
                });
            }
        }
    }

    for travel_period in &inputs.travel_periods {
        if travel_period.date_range.end < travel_period.date_range.start {
            return Err(ValidationError::InvalidTravelRange {
                travel_period: travel_period.id.to_string(),
            });
        }
    }

    detect_backup_cycle(&inputs.activities)?;

    Ok(())
}

/// Depth-first cycle detection over `backup_activity_ids` (§9, "Cyclic
/// graph risk"). The core may assume acyclicity once this passes.
fn detect_backup_cycle(activities: &[Activity]) -> Result<(), ValidationError> {
    use std::collections::HashMap;

    let by_id: HashMap<&ActivityId, &Activity> = activities.iter().map(|a| (&a.id, a)).collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<&ActivityId, Mark> = HashMap::new();

    fn visit<'a>(
        activity: &'a Activity,
        by_id: &HashMap<&'a ActivityId, &'a Activity>,
        marks: &mut HashMap<&'a ActivityId, Mark>,
    ) -> Result<(), ValidationError> {
        marks.insert(&activity.id, Mark::InProgress);
        for backup_id in &activity.backup_activity_ids {
            let Some(backup) = by_id.get(backup_id) else { continue };
            match marks.get(&backup.id) {
                Some(Mark::InProgress) => {
                    return Err(ValidationError::BackupCycle { activity: activity.id.clone() });
                }
                Some(Mark::Done) => continue,
                None => visit(backup, by_id, marks)?,
            }
        }
        marks.insert(&activity.id, Mark::Done);
        Ok(())
    }

    for activity in activities {
        if marks.get(&activity.id).is_none() {
            visit(activity, &by_id, &mut marks)?;
        }
    }

    Ok(())
}
