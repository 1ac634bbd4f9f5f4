//! Named builder functions for the scenario and property tests, grouped
//! by entity the way the teacher's `testing::fixtures` module is.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};

use crate::domain::{
    Activity, ActivityId, ActivityType, DateRange, Equipment, EquipmentId, Frequency,
    Location, Specialist, SpecialistId, TravelPeriod, TravelPeriodId,
};

pub fn naive_time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn naive_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==== Activities ====

/// A minimal Daily activity with no resources and no time window: one
/// instance per day, placeable on the fixed anchor grid.
pub fn daily_activity(id: &str, priority: u8, duration_minutes: u32) -> Activity {
    Activity {
        id: ActivityId::from(id),
        name: id.to_string(),
        activity_type: ActivityType::Fitness,
        priority,
        duration_minutes,
        prep_minutes: 0,
        frequency: Frequency::Daily { preferred_days: HashSet::new() },
        specialist_id: None,
        equipment_ids: vec![],
        location: Location::Any,
        remote_capable: true,
        time_window_start: None,
        time_window_end: None,
        backup_activity_ids: vec![],
    }
}

/// A Weekly activity with a narrow time window, used for window-fidelity
/// and liquid-overflow scenarios.
pub fn weekly_activity_with_window(
    id: &str,
    priority: u8,
    count: u8,
    duration_minutes: u32,
    window_start: NaiveTime,
    window_end: NaiveTime,
) -> Activity {
    Activity {
        id: ActivityId::from(id),
        name: id.to_string(),
        activity_type: ActivityType::Fitness,
        priority,
        duration_minutes,
        prep_minutes: 0,
        frequency: Frequency::Weekly { count, preferred_days: HashSet::new() },
        specialist_id: None,
        equipment_ids: vec![],
        location: Location::Any,
        remote_capable: true,
        time_window_start: Some(window_start),
        time_window_end: Some(window_end),
        backup_activity_ids: vec![],
    }
}

/// A Weekly gym activity requiring non-portable equipment, with a
/// declared backup chain — used for backup-activation scenarios.
pub fn weekly_gym_activity_with_backup(
    id: &str,
    priority: u8,
    count: u8,
    equipment_id: &str,
    window_start: NaiveTime,
    window_end: NaiveTime,
    backup_id: &str,
) -> Activity {
    Activity {
        id: ActivityId::from(id),
        name: id.to_string(),
        activity_type: ActivityType::Fitness,
        priority,
        duration_minutes: 45,
        prep_minutes: 0,
        frequency: Frequency::Weekly { count, preferred_days: HashSet::new() },
        specialist_id: None,
        equipment_ids: vec![EquipmentId::from(equipment_id)],
        location: Location::Gym,
        remote_capable: false,
        time_window_start: Some(window_start),
        time_window_end: Some(window_end),
        backup_activity_ids: vec![ActivityId::from(backup_id)],
    }
}

/// A Home-based, remote-capable backup activity with no resources.
pub fn home_backup_activity(id: &str, priority: u8, duration_minutes: u32) -> Activity {
    Activity {
        id: ActivityId::from(id),
        name: id.to_string(),
        activity_type: ActivityType::Fitness,
        priority,
        duration_minutes,
        prep_minutes: 0,
        frequency: Frequency::Weekly { count: 1, preferred_days: HashSet::new() },
        specialist_id: None,
        equipment_ids: vec![],
        location: Location::Home,
        remote_capable: true,
        time_window_start: None,
        time_window_end: None,
        backup_activity_ids: vec![],
    }
}

// ==== Specialists ====

pub fn specialist_available_every_day(id: &str, max_concurrent_clients: u32) -> Specialist {
    use crate::domain::AvailabilityWindow;
    Specialist {
        id: SpecialistId::from(id),
        specialist_type: "generic".into(),
        availability: (0..7)
            .map(|weekday| AvailabilityWindow {
                weekday,
                start: naive_time(6, 0),
                end: naive_time(21, 0),
            })
            .collect(),
        blackout_dates: HashSet::new(),
        max_concurrent_clients,
    }
}

// ==== Equipment ====

pub fn portable_equipment(id: &str, max_concurrent_users: u32) -> Equipment {
    Equipment {
        id: EquipmentId::from(id),
        location_label: "home".into(),
        is_portable: true,
        maintenance_intervals: vec![],
        max_concurrent_users,
    }
}

pub fn fixed_equipment(id: &str, max_concurrent_users: u32) -> Equipment {
    Equipment {
        id: EquipmentId::from(id),
        location_label: "gym".into(),
        is_portable: false,
        maintenance_intervals: vec![],
        max_concurrent_users,
    }
}

// ==== Travel periods ====

pub fn hotel_trip_without_equipment(id: &str, start: NaiveDate, end: NaiveDate) -> TravelPeriod {
    TravelPeriod {
        id: TravelPeriodId::from(id),
        location_label: "Hotel".into(),
        date_range: DateRange { start, end },
        remote_activities_only: false,
        available_equipment_ids: Some(HashSet::new()),
    }
}

pub fn detox_trip(id: &str, start: NaiveDate, end: NaiveDate) -> TravelPeriod {
    TravelPeriod {
        id: TravelPeriodId::from(id),
        location_label: "Retreat".into(),
        date_range: DateRange { start, end },
        remote_activities_only: true,
        available_equipment_ids: None,
    }
}
