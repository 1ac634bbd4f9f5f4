//! Deterministic greedy scheduling engine for multi-week personal health
//! calendars.
//!
//! The entry point is [`run`] (or [`run_with_sink`] for observability):
//! given a validated set of activities, specialists, equipment, and
//! travel periods, it produces a [`SchedulerState`] — a committed
//! calendar plus a forensic record of anything that could not be placed.

pub mod config;
pub mod domain;
pub mod engine;

/// Fixture builders for Activities/Specialists/Equipment/TravelPeriods,
/// used by this crate's own tests and by the `tests/` scenario suite.
/// Public (not `#[cfg(test)]`-gated) because integration tests in `tests/`
/// compile against the library as an ordinary dependency, the way the
/// teacher's `iqrah-core::testing::fixtures` is consumed by
/// `iqrah-cli`'s integration tests.
pub mod testing;

pub use config::{PriorityCapacityFactors, SchedulerConfig, ScorerWeights};
pub use domain::*;
pub use engine::{
    run, run_with_sink, CollectingEventSink, ConstraintChecker, LoadIntensity, LoggingEventSink,
    NullEventSink, SchedulerEvent, SchedulerEventSink, SchedulerInputs, SchedulerState, Statistics,
};
