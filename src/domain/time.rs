//! Minute-precision time arithmetic shared by the Checker and Scorer.
//!
//! Per §9's "Decimal time arithmetic" design note: all duration math here
//! is integer minutes. The one exception — the scorer's parabolic
//! time-window-fidelity term — lives in `engine::scorer`, not here.

use chrono::NaiveTime;

/// `[start - prep, start + duration)`, the interval used for overlap
/// detection (§4.2 stage 4, "effective interval").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl EffectiveInterval {
    pub fn new(start_time: NaiveTime, prep_minutes: u32, duration_minutes: u32) -> Self {
        let start = start_time - chrono::Duration::minutes(prep_minutes as i64);
        let end = start_time + chrono::Duration::minutes(duration_minutes as i64);
        Self { start, end }
    }

    /// Two effective intervals collide iff each starts before the other ends.
    pub fn overlaps(&self, other: &EffectiveInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Number of whole minutes between two times of day, assuming `end >= start`
/// within the same day (no midnight wraparound — activities do not span
/// midnight in this model).
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn effective_interval_accounts_for_prep() {
        let interval = EffectiveInterval::new(t(9, 30), 15, 60);
        assert_eq!(interval.start, t(9, 15));
        assert_eq!(interval.end, t(10, 30));
    }

    #[test]
    fn overlap_detects_s4_scenario() {
        // A at 09:30, duration 60, prep 15 -> effective [09:15, 10:30)
        let a = EffectiveInterval::new(t(9, 30), 15, 60);
        // B at 10:00, duration 30, prep 0 -> effective [10:00, 10:30) collides
        let b_colliding = EffectiveInterval::new(t(10, 0), 0, 30);
        assert!(a.overlaps(&b_colliding));

        // B moved to 10:30 -> effective [10:30, 11:00) does not collide
        let b_clear = EffectiveInterval::new(t(10, 30), 0, 30);
        assert!(!a.overlaps(&b_clear));
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        let a = EffectiveInterval::new(t(9, 0), 0, 60); // [09:00, 10:00)
        let b = EffectiveInterval::new(t(10, 0), 0, 30); // [10:00, 10:30)
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn minutes_between_computes_plain_difference() {
        assert_eq!(minutes_between(t(9, 0), t(10, 30)), 90);
    }
}
