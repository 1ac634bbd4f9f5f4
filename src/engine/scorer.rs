//! `SlotScorer` — the Judge (§4.3): a pure function ranking legal
//! candidates. Base 50, four additive components, clamped to `[0, 100]`.

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::config::ScorerWeights;
use crate::domain::Activity;
use crate::engine::ledger::SchedulerState;

const BASE_SCORE: i32 = 50;
const NO_NEIGHBOR_GAP_MINUTES: i64 = i64::MAX;

/// Time-window fidelity (§4.3 row 1): a parabola peaking at the window's
/// midpoint, scaled by `weight`. Returns 0 when the activity has no
/// window — the component simply does not apply.
fn time_window_fidelity(activity: &Activity, start_time: NaiveTime, weight: i32) -> i32 {
    let (Some(window_start), Some(window_end)) =
        (activity.time_window_start, activity.time_window_end)
    else {
        return 0;
    };

    let span = crate::domain::minutes_between(window_start, window_end) - activity.duration_minutes as i64;
    if span <= 0 {
        return 0;
    }

    let offset = crate::domain::minutes_between(window_start, start_time) as f64;
    let pos = offset / span as f64;
    let raw = weight as f64 * (1.0 - 4.0 * (pos - 0.5).powi(2));
    raw.round().max(0.0) as i32
}

/// Habit / weekday pattern (§4.3 row 2).
fn habit_pattern(
    activity: &Activity,
    date: NaiveDate,
    ledger: &SchedulerState,
    weight: i32,
) -> i32 {
    let weekday = date.weekday().num_days_from_monday() as u8;
    match ledger.get_weekday_pattern_count(&activity.id, weekday) {
        0 => 0,
        1 => weight / 2,
        _ => weight,
    }
}

/// Computes the gap, in minutes, between `start`/`end` and the nearest
/// neighboring booking on the same date. Returns `NO_NEIGHBOR_GAP_MINUTES`
/// when there is no booking on that side.
fn neighbor_gaps(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    ledger: &SchedulerState,
) -> (i64, i64) {
    let mut gap_before = NO_NEIGHBOR_GAP_MINUTES;
    let mut gap_after = NO_NEIGHBOR_GAP_MINUTES;

    for existing in ledger.get_slots_for_date(date) {
        if existing.end_time() <= start {
            let gap = crate::domain::minutes_between(existing.end_time(), start);
            gap_before = gap_before.min(gap);
        }
        if existing.start_time >= end {
            let gap = crate::domain::minutes_between(end, existing.start_time);
            gap_after = gap_after.min(gap);
        }
    }

    (gap_before, gap_after)
}

/// Clustering / flow (§4.3 row 3).
fn clustering(gap_before: i64, gap_after: i64, bonus: i32, island_penalty: i32) -> i32 {
    if gap_before.min(gap_after) < 15 {
        bonus
    } else if gap_before >= 60 && gap_after >= 60 {
        island_penalty
    } else {
        0
    }
}

/// Resilience buffer (§4.3 row 4): uses `gap_before` only.
fn resilience_buffer(gap_before: i64, bonus: i32, penalty: i32) -> i32 {
    if gap_before < 15 {
        penalty
    } else if (15..=45).contains(&gap_before) {
        bonus
    } else {
        0
    }
}

/// Scores a legal candidate in `[0, 100]`. Callers must have already
/// confirmed legality via `ConstraintChecker::check` — the Scorer does
/// not re-validate.
pub fn score_candidate(
    activity: &Activity,
    date: NaiveDate,
    start_time: NaiveTime,
    ledger: &SchedulerState,
    weights: &ScorerWeights,
) -> i32 {
    let end_time = start_time + chrono::Duration::minutes(activity.duration_minutes as i64);
    let (gap_before, gap_after) = neighbor_gaps(date, start_time, end_time, ledger);

    let total = BASE_SCORE
        + time_window_fidelity(activity, start_time, weights.time_window_fidelity)
        + habit_pattern(activity, date, ledger, weights.habit_pattern)
        + clustering(gap_before, gap_after, weights.clustering_bonus, weights.island_penalty)
        + resilience_buffer(gap_before, weights.resilience_bonus, weights.resilience_penalty);

    total.clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityId, ActivityType, Frequency, Location, SlotStatus, TimeSlot};
    use std::collections::HashSet;

    fn activity_with_window(start: NaiveTime, end: NaiveTime) -> Activity {
        Activity {
            id: ActivityId::from("a"),
            name: "Test".into(),
            activity_type: ActivityType::Fitness,
            priority: 3,
            duration_minutes: 30,
            prep_minutes: 0,
            frequency: Frequency::Daily { preferred_days: HashSet::new() },
            specialist_id: None,
            equipment_ids: vec![],
            location: Location::Home,
            remote_capable: true,
            time_window_start: Some(start),
            time_window_end: Some(end),
            backup_activity_ids: vec![],
        }
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn midpoint_of_window_earns_full_fidelity_bonus() {
        let activity = activity_with_window(t(7, 0), t(9, 0));
        // window span usable for positioning = 120 - 30 = 90 min; midpoint start = 7:45
        let score = time_window_fidelity(&activity, t(7, 45), 20);
        assert_eq!(score, 20);
    }

    #[test]
    fn window_edge_earns_no_fidelity_bonus() {
        let activity = activity_with_window(t(7, 0), t(9, 0));
        let score = time_window_fidelity(&activity, t(7, 0), 20);
        assert_eq!(score, 0);
    }

    #[test]
    fn no_window_means_zero_fidelity_component() {
        let mut activity = activity_with_window(t(7, 0), t(9, 0));
        activity.time_window_start = None;
        activity.time_window_end = None;
        assert_eq!(time_window_fidelity(&activity, t(7, 45), 20), 0);
    }

    #[test]
    fn habit_pattern_rewards_prior_weekday_bookings() {
        let activity = activity_with_window(t(7, 0), t(9, 0));
        let mut ledger = SchedulerState::new();
        assert_eq!(habit_pattern(&activity, monday(), &ledger, 10), 0);

        ledger
            .add_booking(TimeSlot {
                activity_id: activity.id.clone(),
                priority: 3,
                date: monday() - chrono::Duration::weeks(1),
                start_time: t(7, 0),
                duration_minutes: 30,
                prep_minutes: 0,
                specialist_id: None,
                equipment_ids: vec![],
                is_backup: false,
                original_activity_id: None,
                status: SlotStatus::Scheduled,
            })
            .unwrap();
        assert_eq!(habit_pattern(&activity, monday(), &ledger, 10), 5);
    }

    #[test]
    fn tight_gap_earns_clustering_bonus_not_resilience_bonus() {
        assert_eq!(clustering(10, 100, 15, -5), 15);
        assert_eq!(resilience_buffer(10, 10, -10), -10);
    }

    #[test]
    fn comfortable_gap_earns_resilience_bonus() {
        assert_eq!(resilience_buffer(30, 10, -10), 10);
    }

    #[test]
    fn isolated_booking_on_an_empty_day_is_penalized() {
        let (gap_before, gap_after) = neighbor_gaps(monday(), t(9, 0), t(9, 30), &SchedulerState::new());
        assert_eq!(clustering(gap_before, gap_after, 15, -5), -5);
    }
}
