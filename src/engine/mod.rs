pub mod checker;
pub mod events;
pub mod ledger;
pub mod orchestrator;
pub mod scorer;
pub mod types;

pub use checker::ConstraintChecker;
pub use events::{CollectingEventSink, LoggingEventSink, NullEventSink, SchedulerEvent, SchedulerEventSink};
pub use ledger::{LoadIntensity, SchedulerState, Statistics};
pub use orchestrator::{run, run_with_sink, SchedulerInputs};
pub use scorer::score_candidate;
pub use types::{Candidate, DemandInstance, Tier};
