//! Optional run parameters (§6, §12).
//!
//! `SchedulerConfig::default()` reproduces the literal constants of §4.1
//! and §4.3 exactly, so callers who pass no config get the behavior the
//! scenario tests (§8) assert on.

use chrono::NaiveTime;

/// Weights for the four additive components of the Judge (§4.3). Exposed
/// as overridable fields, the way the teacher's `UserProfile` exposes
/// scoring weights, so a caller can re-tune the scorer without forking
/// the crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerWeights {
    /// Max award for time-window fidelity (default 20).
    pub time_window_fidelity: i32,
    /// Award for a weekday habit seen >= 2 times (default 10); half that for exactly 1.
    pub habit_pattern: i32,
    /// Award for clustering within 15 minutes of another booking (default 15).
    pub clustering_bonus: i32,
    /// Penalty for an "island" booking with >=60 minute gaps on both sides (default -5).
    pub island_penalty: i32,
    /// Award for a resilience-buffer gap of 15-45 minutes before the slot (default 10).
    pub resilience_bonus: i32,
    /// Penalty when the resilience-buffer gap before the slot is under 15 minutes (default -10).
    pub resilience_penalty: i32,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            time_window_fidelity: 20,
            habit_pattern: 10,
            clustering_bonus: 15,
            island_penalty: -5,
            resilience_bonus: 10,
            resilience_penalty: -10,
        }
    }
}

/// Per-priority daily capacity factors, indexed `[priority - 1]` (§4.1).
/// `capacity_factor(p) x (24 x 60)` bounds the total scheduled minutes for
/// priority `<= p` on any given day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityCapacityFactors(pub [f32; 5]);

impl Default for PriorityCapacityFactors {
    fn default() -> Self {
        Self([1.00, 0.80, 0.60, 0.50, 0.40])
    }
}

impl PriorityCapacityFactors {
    pub fn factor_for(&self, priority: u8) -> f32 {
        let idx = priority.clamp(1, 5) as usize - 1;
        self.0[idx]
    }
}

/// Top-level configuration for a scheduling run. Mirrors the teacher's
/// `SessionMixConfig`: a plain `Copy`-able struct, a literal `Default`,
/// and a `validate()` that checks the invariants the constructor doesn't
/// enforce structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub priority_capacity_factors: PriorityCapacityFactors,
    pub anchor_times: Vec<NaiveTime>,
    pub candidate_step_minutes: u32,
    pub scorer_weights: ScorerWeights,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let anchor_hours_minutes = [
            (6, 0),
            (7, 0),
            (8, 0),
            (9, 0),
            (12, 0),
            (14, 0),
            (17, 0),
            (18, 0),
            (19, 0),
            (20, 0),
        ];
        let anchor_times = anchor_hours_minutes
            .iter()
            .map(|(h, m)| NaiveTime::from_hms_opt(*h, *m, 0).unwrap())
            .collect();

        Self {
            priority_capacity_factors: PriorityCapacityFactors::default(),
            anchor_times,
            candidate_step_minutes: 15,
            scorer_weights: ScorerWeights::default(),
        }
    }
}

impl SchedulerConfig {
    /// Checks the structural assumptions the orchestrator relies on:
    /// non-increasing, in-range capacity factors; sorted/deduplicated
    /// anchors; a step that divides an hour evenly.
    pub fn validate(&self) -> bool {
        let factors = self.priority_capacity_factors.0;
        let factors_ok = factors
            .iter()
            .all(|f| *f > 0.0 && *f <= 1.0)
            && factors.windows(2).all(|w| w[0] >= w[1]);

        let mut sorted_anchors = self.anchor_times.clone();
        sorted_anchors.sort();
        sorted_anchors.dedup();
        let anchors_ok = sorted_anchors == self.anchor_times && !self.anchor_times.is_empty();

        let step_ok = self.candidate_step_minutes > 0 && 60 % self.candidate_step_minutes == 0;

        factors_ok && anchors_ok && step_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SchedulerConfig::default().validate());
    }

    #[test]
    fn default_capacity_factors_match_spec_literal_values() {
        let factors = PriorityCapacityFactors::default();
        assert_eq!(factors.factor_for(1), 1.00);
        assert_eq!(factors.factor_for(2), 0.80);
        assert_eq!(factors.factor_for(3), 0.60);
        assert_eq!(factors.factor_for(4), 0.50);
        assert_eq!(factors.factor_for(5), 0.40);
    }

    #[test]
    fn non_monotonic_factors_fail_validation() {
        let mut config = SchedulerConfig::default();
        config.priority_capacity_factors.0 = [0.5, 0.6, 0.6, 0.5, 0.4];
        assert!(!config.validate());
    }

    #[test]
    fn step_that_does_not_divide_an_hour_fails_validation() {
        let mut config = SchedulerConfig::default();
        config.candidate_step_minutes = 7;
        assert!(!config.validate());
    }
}
