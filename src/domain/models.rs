use super::value_objects::{Block, CourseCode, Priority, ProfessorId, SectionId, SolutionStatus};
use serde::Serialize;
use std::collections::BTreeSet;

/// A course as offered in the catalog. Read-only input for a scheduling run.
#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub code: CourseCode,
    pub title: String,
    /// Declared length in terms; carried through for reporting.
    pub length: u32,
    /// Free-form catalog priority tag, distinct from request tiers.
    pub priority_tag: Option<String>,
    /// Blocks the course may be scheduled in. Disjoint from
    /// `unavailable_blocks` once normalized.
    pub available_blocks: BTreeSet<Block>,
    pub unavailable_blocks: BTreeSet<Block>,
    pub minimum_section_size: u32,
    pub target_section_size: u32,
    pub maximum_section_size: u32,
    /// Declared number of sections; the actual sections come from lecturer
    /// assignment data and may disagree (reported, not fatal).
    pub number_of_sections: u32,
    pub total_credits: u32,
}

/// One offered instance of a course, with the professors qualified to teach
/// it (derived from lecturer assignments, never chosen freely by the model).
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub qualified_professors: BTreeSet<ProfessorId>,
}

/// A professor and the sections they are qualified to teach.
#[derive(Debug, Clone, Serialize)]
pub struct Professor {
    pub id: ProfessorId,
    pub qualified_sections: BTreeSet<SectionId>,
}

/// A student's request for a course at a given priority tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRequest {
    pub student: crate::domain::StudentId,
    pub course: CourseCode,
    pub priority: Priority,
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_binary_vars: u32,
    pub num_continuous_vars: u32,
}

/// Total valuation of an assignment model: a solver status, the achieved
/// objective, and one value per registered variable (indexed by `VarId`).
///
/// Downstream schedules are pure projections of this valuation; they are
/// recomputed, never mutated.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn incumbent(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::FeasibleTimeout,
            objective_value: Some(value),
            variable_values,
            message: "Time budget reached; best incumbent returned".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// True when the valuation is usable for extraction. A timed-out
    /// incumbent is treated identically to an optimum here; only the
    /// reported status differs.
    pub fn is_feasible(&self) -> bool {
        matches!(
            self.status,
            SolutionStatus::Optimal | SolutionStatus::FeasibleTimeout
        )
    }

    /// Value of one variable, rounded to the nearest integer. Solvers may
    /// return values close to but not exactly 0/1; anything missing from the
    /// valuation is structurally fixed at 0.
    pub fn rounded_value(&self, index: usize) -> i64 {
        self.variable_values
            .get(index)
            .copied()
            .unwrap_or(0.0)
            .round() as i64
    }
}
