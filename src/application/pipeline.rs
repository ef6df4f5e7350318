//! Run orchestration: normalize → build → solve → extract → project.
//!
//! The pipeline is a single-pass, synchronous batch computation. Once the
//! model is built, nothing here aborts the run: solver failures and
//! infeasibility are converted into structured diagnostics on the output,
//! since partial results remain useful to operators making manual
//! corrections.

use crate::domain::{
    Diagnostic, Solution, SolutionStatus, SolverBackend, SolverService,
};
use crate::extract::{
    FulfillmentStats, ProfessorSchedules, ScheduleExtractor, StudentSchedules, UnmetRequired,
};
use crate::model::{ModelBuilder, ModelConfig};
use crate::normalize::{CourseRecord, LecturerRecord, Normalizer, RequestRecord};
use crate::project::{BlockGrid, BlockProjector};
use crate::solver::SolverFactory;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for one scheduling run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub backend: SolverBackend,
    /// Wall-clock budget for the solve step. Mandatory: the solve call is
    /// the only long-running operation and must never block indefinitely.
    pub time_budget: Duration,
    /// See [`ModelConfig::balance_penalty`].
    pub balance_penalty: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_budget: Duration::from_secs(60),
            balance_penalty: ModelConfig::default().balance_penalty,
        }
    }
}

/// Complete output of one scheduling run, ready for downstream reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRun {
    /// Run-level status. Differs from `stats.status` (the raw solver
    /// status) only when structurally unsatisfiable Required requests made
    /// the declared model infeasible while the separable remainder was
    /// still solved best-effort.
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub student_schedules: StudentSchedules,
    pub professor_schedules: ProfessorSchedules,
    pub stats: FulfillmentStats,
    pub unmet_required: Vec<UnmetRequired>,
    pub student_grid: BlockGrid,
    pub professor_grid: BlockGrid,
    pub diagnostics: Vec<Diagnostic>,
}

/// Application service driving the whole pipeline.
pub struct Scheduler {
    solver: Arc<dyn SolverService>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let solver = SolverFactory::create(config.backend);
        Self { solver, config }
    }

    /// Bypass the factory, for callers substituting their own backend.
    pub fn with_solver(config: SchedulerConfig, solver: Arc<dyn SolverService>) -> Self {
        Self { solver, config }
    }

    pub fn run(
        &self,
        courses: &[CourseRecord],
        lecturers: &[LecturerRecord],
        requests: &[RequestRecord],
    ) -> ScheduleRun {
        let data = Normalizer::normalize(courses, lecturers, requests);
        let model = ModelBuilder::build(
            &data,
            &ModelConfig {
                balance_penalty: self.config.balance_penalty,
            },
        );

        let mut diagnostics = data.diagnostics.clone();
        for request in &model.unsatisfiable_required {
            diagnostics.push(Diagnostic::UnsatisfiableRequired {
                student: request.student.clone(),
                course: request.course.clone(),
            });
        }

        let solution = if model.registry.is_empty() {
            info!("model has no decision variables; nothing to solve");
            Solution::optimal(0.0, Vec::new())
        } else {
            info!(
                "dispatching {} variables / {} constraints to {} with a {:?} budget",
                model.num_variables(),
                model.num_constraints(),
                self.solver.name(),
                self.config.time_budget
            );
            match self.solver.solve(&model, self.config.time_budget) {
                Ok(solution) => solution,
                Err(e) => {
                    warn!("solver failed: {e}");
                    diagnostics.push(Diagnostic::SolverFailure {
                        message: e.to_string(),
                    });
                    Solution::new(SolutionStatus::Error, e.to_string())
                }
            }
        };

        match solution.status {
            SolutionStatus::Optimal => {}
            status => warn!("solve finished with status {status}: {}", solution.message),
        }

        // The declared model is infeasible whenever a Required request has
        // no candidate assignment, even though the separable remainder was
        // still solved for a best-effort partial schedule.
        let status = if model.is_structurally_infeasible() {
            SolutionStatus::Infeasible
        } else {
            solution.status
        };

        let extracted = ScheduleExtractor::extract(&model, &solution, &data);
        let student_grid = BlockProjector::project_students(&extracted.students, &data.blocks);
        let professor_grid =
            BlockProjector::project_professors(&extracted.professors, &data.blocks);

        ScheduleRun {
            status,
            objective_value: solution.objective_value,
            student_schedules: extracted.students,
            professor_schedules: extracted.professors,
            stats: extracted.stats,
            unmet_required: extracted.unmet_required,
            student_grid,
            professor_grid,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{solver_service, Priority, SolverError};
    use crate::model::AssignmentModel;

    struct FailingSolver;

    impl SolverService for FailingSolver {
        fn solve(
            &self,
            _model: &AssignmentModel,
            _time_budget: Duration,
        ) -> solver_service::Result<Solution> {
            Err(SolverError::ExecutionFailed("backend exploded".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn supports_mip(&self) -> bool {
            true
        }
    }

    #[test]
    fn solver_failure_becomes_a_diagnostic_not_a_panic() {
        let scheduler =
            Scheduler::with_solver(SchedulerConfig::default(), Arc::new(FailingSolver));
        let run = scheduler.run(
            &[CourseRecord {
                course_code: "a1".into(),
                title: "A".into(),
                length: 1,
                priority: None,
                available_blocks: vec!["A".into()],
                unavailable_blocks: vec![],
                minimum_section_size: 1,
                target_section_size: 1,
                maximum_section_size: 5,
                number_of_sections: 1,
                total_credits: 1,
            }],
            &[LecturerRecord {
                course_code: "a1".into(),
                section_number: Some(1),
                professor_id: "p1".into(),
                start_term: None,
                term_name: None,
            }],
            &[RequestRecord {
                student_id: "s1".into(),
                course_code: "a1".into(),
                request_type: Priority::Requested,
            }],
        );

        assert_eq!(run.status, SolutionStatus::Error);
        assert!(run.student_schedules.is_empty());
        assert!(run
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::SolverFailure { .. })));
    }

    #[test]
    fn empty_inputs_produce_an_empty_run() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let run = scheduler.run(&[], &[], &[]);
        assert_eq!(run.status, SolutionStatus::Optimal);
        assert!(run.student_schedules.is_empty());
        assert!(run.unmet_required.is_empty());
        assert!(run.student_grid.blocks.is_empty());
    }
}
