//! `ConstraintChecker` — the Gatekeeper (§4.2): a pure, fail-fast
//! validation pipeline. Reads the Ledger and the static resource lookups;
//! mutates nothing.
//!
//! Stage order is contractual: the first stage to fail determines the
//! `ConstraintViolation` kind reported, and diagnostics/tests rely on it.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::domain::{
    Activity, ConstraintViolation, Equipment, EquipmentId, Specialist, SpecialistId, TravelPeriod,
};
use crate::engine::ledger::SchedulerState;

/// Resource lookups the Checker consults. Built once per run from the
/// validated input collections and borrowed for every candidate
/// evaluation (§9, "Checker and Scorer never hold the Ledger after
/// returning").
pub struct ConstraintChecker<'a> {
    specialists: HashMap<&'a SpecialistId, &'a Specialist>,
    equipment: HashMap<&'a EquipmentId, &'a Equipment>,
    travel_periods: &'a [TravelPeriod],
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(
        specialists: &'a [Specialist],
        equipment: &'a [Equipment],
        travel_periods: &'a [TravelPeriod],
    ) -> Self {
        Self {
            specialists: specialists.iter().map(|s| (&s.id, s)).collect(),
            equipment: equipment.iter().map(|e| (&e.id, e)).collect(),
            travel_periods,
        }
    }

    fn travel_period_covering(&self, date: NaiveDate) -> Option<&TravelPeriod> {
        self.travel_periods.iter().find(|t| t.covers(date))
    }

    fn is_portable(&self, id: &EquipmentId) -> bool {
        self.equipment.get(id).map(|e| e.is_portable).unwrap_or(false)
    }

    /// Runs all five stages in order, returning the first violation
    /// encountered, or `Ok(())` if the candidate is legal.
    pub fn check(
        &self,
        activity: &Activity,
        date: NaiveDate,
        start_time: NaiveTime,
        is_backup: bool,
        ledger: &SchedulerState,
    ) -> Result<(), ConstraintViolation> {
        let end_time = start_time + chrono::Duration::minutes(activity.duration_minutes as i64);

        self.check_travel(activity, date, is_backup)?;
        self.check_specialist(activity, date, start_time, end_time, ledger)?;
        self.check_equipment(activity, date, start_time, end_time, ledger)?;
        self.check_overlap(activity, date, start_time, ledger)?;
        self.check_time_window(activity, date, start_time)?;
        Ok(())
    }

    fn violation(
        kind: fn(String, crate::domain::ActivityId, NaiveDate) -> ConstraintViolation,
        reason: impl Into<String>,
        activity: &Activity,
        date: NaiveDate,
    ) -> ConstraintViolation {
        kind(reason.into(), activity.id.clone(), date)
    }

    /// Stage 1 — travel context.
    fn check_travel(
        &self,
        activity: &Activity,
        date: NaiveDate,
        is_backup: bool,
    ) -> Result<(), ConstraintViolation> {
        let Some(travel) = self.travel_period_covering(date) else {
            return Ok(());
        };
        if is_backup {
            return Ok(());
        }

        let effectively_remote = activity.is_effectively_remote(|id| self.is_portable(id));

        if travel.remote_activities_only && !effectively_remote {
            return Err(Self::violation(
                ConstraintViolation::Travel,
                "trip is remote-activities-only and activity is not effectively remote",
                activity,
                date,
            ));
        }

        if let Some(available) = &travel.available_equipment_ids {
            let missing = activity
                .equipment_ids
                .iter()
                .any(|id| !self.is_portable(id) && !available.contains(id));
            if missing {
                return Err(Self::violation(
                    ConstraintViolation::Travel,
                    "required non-portable equipment is not available at the destination",
                    activity,
                    date,
                ));
            }
        }

        if activity.location == crate::domain::Location::Home && !effectively_remote {
            return Err(Self::violation(
                ConstraintViolation::Travel,
                "activity requires home location but the user is traveling",
                activity,
                date,
            ));
        }

        Ok(())
    }

    /// Stage 2 — specialist availability.
    fn check_specialist(
        &self,
        activity: &Activity,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        ledger: &SchedulerState,
    ) -> Result<(), ConstraintViolation> {
        let Some(specialist_id) = &activity.specialist_id else {
            return Ok(());
        };
        let Some(specialist) = self.specialists.get(specialist_id) else {
            return Err(Self::violation(
                ConstraintViolation::Specialist,
                "unknown specialist",
                activity,
                date,
            ));
        };

        let weekday = date.weekday().num_days_from_monday() as u8;
        let has_window = specialist
            .availability
            .iter()
            .any(|w| w.weekday == weekday && w.start <= start_time && end_time <= w.end);
        if !has_window {
            return Err(Self::violation(
                ConstraintViolation::Specialist,
                "no availability window covers the requested time",
                activity,
                date,
            ));
        }

        if specialist.blackout_dates.contains(&date) {
            return Err(Self::violation(
                ConstraintViolation::Specialist,
                "date is a blackout day for this specialist",
                activity,
                date,
            ));
        }

        let overlapping = ledger.specialist_overlap_count(specialist_id, date, start_time, end_time);
        if overlapping >= specialist.max_concurrent_clients as usize {
            return Err(Self::violation(
                ConstraintViolation::Specialist,
                "specialist is at max_concurrent_clients capacity",
                activity,
                date,
            ));
        }

        Ok(())
    }

    /// Stage 3 — equipment.
    fn check_equipment(
        &self,
        activity: &Activity,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        ledger: &SchedulerState,
    ) -> Result<(), ConstraintViolation> {
        let traveling = self.travel_period_covering(date);

        for equipment_id in &activity.equipment_ids {
            let Some(equipment) = self.equipment.get(equipment_id) else {
                return Err(Self::violation(
                    ConstraintViolation::Equipment,
                    "unknown equipment",
                    activity,
                    date,
                ));
            };

            if let Some(travel) = traveling {
                let available_at_destination = equipment.is_portable
                    || travel
                        .available_equipment_ids
                        .as_ref()
                        .map(|set| set.contains(equipment_id))
                        .unwrap_or(false);
                if !available_at_destination {
                    return Err(Self::violation(
                        ConstraintViolation::Equipment,
                        "required equipment is not available while traveling",
                        activity,
                        date,
                    ));
                }
                continue;
            }

            if equipment.maintenance_intervals.iter().any(|r| r.contains(date)) {
                return Err(Self::violation(
                    ConstraintViolation::Equipment,
                    "equipment is under maintenance on this date",
                    activity,
                    date,
                ));
            }

            let overlapping = ledger.equipment_overlap_count(equipment_id, date, start_time, end_time);
            if overlapping >= equipment.max_concurrent_users as usize {
                return Err(Self::violation(
                    ConstraintViolation::Equipment,
                    "equipment is at max_concurrent_users capacity",
                    activity,
                    date,
                ));
            }
        }

        Ok(())
    }

    /// Stage 4 — effective-interval overlap with existing user bookings.
    fn check_overlap(
        &self,
        activity: &Activity,
        date: NaiveDate,
        start_time: NaiveTime,
        ledger: &SchedulerState,
    ) -> Result<(), ConstraintViolation> {
        let candidate = crate::domain::EffectiveInterval::new(
            start_time,
            activity.prep_minutes,
            activity.duration_minutes,
        );

        for existing in ledger.get_slots_for_date(date) {
            let existing_interval = crate::domain::EffectiveInterval::new(
                existing.start_time,
                existing.prep_minutes,
                existing.duration_minutes,
            );
            if candidate.overlaps(&existing_interval) {
                return Err(Self::violation(
                    ConstraintViolation::Overlap,
                    "effective interval collides with an existing booking",
                    activity,
                    date,
                ));
            }
        }

        Ok(())
    }

    /// Stage 5 — time window.
    fn check_time_window(
        &self,
        activity: &Activity,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<(), ConstraintViolation> {
        if let (Some(window_start), Some(window_end)) =
            (activity.time_window_start, activity.time_window_end)
        {
            let end_time = start_time + chrono::Duration::minutes(activity.duration_minutes as i64);
            if start_time < window_start || end_time > window_end {
                return Err(Self::violation(
                    ConstraintViolation::TimeWindow,
                    "start time falls outside the activity's time window",
                    activity,
                    date,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Activity, ActivityId, ActivityType, DateRange, Frequency, Location};
    use rstest::rstest;
    use std::collections::HashSet;

    fn base_activity() -> Activity {
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
            time_window_start: None,
            time_window_end: None,
            backup_activity_ids: vec![],
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn legal_candidate_with_no_resources_passes_every_stage() {
        let checker = ConstraintChecker::new(&[], &[], &[]);
        let ledger = SchedulerState::new();
        let activity = base_activity();
        assert!(checker.check(&activity, monday(), t(7, 0), false, &ledger).is_ok());
    }

    #[test]
    fn stage_5_rejects_start_time_outside_window() {
        let checker = ConstraintChecker::new(&[], &[], &[]);
        let ledger = SchedulerState::new();
        let mut activity = base_activity();
        activity.time_window_start = Some(t(7, 0));
        activity.time_window_end = Some(t(9, 0));

        let result = checker.check(&activity, monday(), t(6, 0), false, &ledger);
        assert_eq!(result.unwrap_err().kind_name(), "time_window");
    }

    #[test]
    fn stage_1_blocks_home_activity_while_traveling() {
        let travel = TravelPeriod {
            id: crate::domain::TravelPeriodId::from("trip"),
            location_label: "Hotel".into(),
            date_range: DateRange { start: monday(), end: monday() },
            remote_activities_only: false,
            available_equipment_ids: None,
        };
        let checker = ConstraintChecker::new(&[], &[], std::slice::from_ref(&travel));
        let ledger = SchedulerState::new();
        let mut activity = base_activity();
        activity.remote_capable = false;

        let result = checker.check(&activity, monday(), t(7, 0), false, &ledger);
        assert_eq!(result.unwrap_err().kind_name(), "travel");
    }

    #[test]
    fn stage_1_grants_backups_diplomatic_immunity() {
        let travel = TravelPeriod {
            id: crate::domain::TravelPeriodId::from("trip"),
            location_label: "Hotel".into(),
            date_range: DateRange { start: monday(), end: monday() },
            remote_activities_only: true,
            available_equipment_ids: None,
        };
        let checker = ConstraintChecker::new(&[], &[], std::slice::from_ref(&travel));
        let ledger = SchedulerState::new();
        let mut activity = base_activity();
        activity.remote_capable = false;

        assert!(checker.check(&activity, monday(), t(7, 0), true, &ledger).is_ok());
    }

    #[rstest]
    #[case(30, true)]
    #[case(90, false)]
    fn stage_4_overlap_depends_on_duration(#[case] duration: u32, #[case] expect_ok: bool) {
        let checker = ConstraintChecker::new(&[], &[], &[]);
        let mut ledger = SchedulerState::new();
        ledger
            .add_booking(crate::domain::TimeSlot {
                activity_id: ActivityId::from("existing"),
                priority: 3,
                date: monday(),
                start_time: t(9, 0),
                duration_minutes: 60,
                prep_minutes: 0,
                specialist_id: None,
                equipment_ids: vec![],
                is_backup: false,
                original_activity_id: None,
                status: crate::domain::SlotStatus::Scheduled,
            })
            .unwrap();

        let mut activity = base_activity();
        activity.duration_minutes = duration;
        let result = checker.check(&activity, monday(), t(8, 0), false, &ledger);
        assert_eq!(result.is_ok(), expect_ok);
    }
}
