// Application layer: pipeline orchestration

pub mod pipeline;

pub use pipeline::{ScheduleRun, Scheduler, SchedulerConfig};
