//! blockplan: priority-weighted course section and time-block assignment.
//!
//! Translates normalized course, lecturer, and student-request data into a
//! binary linear assignment model, dispatches it to a pluggable MILP
//! backend, and decodes the returned valuation into schedules, fulfillment
//! statistics, and entity × block grids.

// Domain layer: scheduling entities, value objects, solver contract
pub mod domain;

// Data normalizer: raw boundary records to canonical indexed data
pub mod normalize;

// Model builder: decision variables, constraints, objective
pub mod model;

// Solver adapters: concrete implementations of SolverService
pub mod solver;

// Schedule extractor: solution decoding and fulfillment statistics
pub mod extract;

// Block projector: dense entity × block grids for reporting
pub mod project;

// Application layer: pipeline orchestration
pub mod application;

// Re-export commonly used types
pub use domain::{
    Block, Course, CourseCode, Diagnostic, Priority, Professor, ProfessorId, Section, SectionId,
    Solution, SolutionStatus, SolverBackend, SolverError, SolverService, StudentId, StudentRequest,
};

pub use application::{ScheduleRun, Scheduler, SchedulerConfig};
pub use extract::{FulfillmentStats, ScheduleExtractor, TierStats, UnmetRequired};
pub use model::{AssignmentModel, ModelBuilder, ModelConfig};
pub use normalize::{CourseRecord, LecturerRecord, NormalizedData, Normalizer, RequestRecord};
pub use project::{BlockGrid, BlockProjector};
pub use solver::{MicrolpSolver, SolverFactory};
