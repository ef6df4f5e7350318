// Domain service interface for solving assignment models.
// Defines the contract that any solver backend must follow, so the model
// layer never depends on a concrete engine.

use super::models::Solution;
use crate::model::AssignmentModel;
use std::time::Duration;

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Solver backend not available: {0}")]
    BackendUnavailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Contract for optimization backends.
///
/// The solve call is the single blocking, potentially long-running operation
/// in the pipeline; the wall-clock budget is therefore mandatory. When the
/// budget expires before an optimality proof, the best incumbent is returned
/// with [`SolutionStatus::FeasibleTimeout`](crate::domain::SolutionStatus)
/// and callers extract from it exactly as from an optimum.
pub trait SolverService: Send + Sync {
    /// Solve an assignment model within the given wall-clock budget.
    fn solve(&self, model: &AssignmentModel, time_budget: Duration) -> Result<Solution>;

    /// Validate a model without solving it.
    fn validate(&self, model: &AssignmentModel) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = model.num_variables();

        if num_vars == 0 {
            errors.push("model has no decision variables".to_string());
        }

        for (i, constraint) in model.constraints.iter().enumerate() {
            if constraint.terms.is_empty() {
                errors.push(format!(
                    "constraint {} '{}' has no terms",
                    i, constraint.name
                ));
            }
            for &(id, _) in &constraint.terms {
                if id.index() >= num_vars {
                    errors.push(format!(
                        "constraint {} '{}' references unregistered variable {}",
                        i,
                        constraint.name,
                        id.index()
                    ));
                }
            }
        }

        for &(id, _) in &model.objective.terms {
            if id.index() >= num_vars {
                errors.push(format!(
                    "objective references unregistered variable {}",
                    id.index()
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidModel(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
