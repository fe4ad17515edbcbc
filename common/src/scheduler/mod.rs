// Scheduler module: reconciles desired refresh jobs against live per-table tasks

pub mod engine;
pub mod job;

pub use engine::{
    ControllerState, ReconcileSummary, RefreshRunner, Scheduler, SchedulerConfig, SchedulerEngine,
};
