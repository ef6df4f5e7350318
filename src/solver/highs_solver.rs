// HiGHS Solver Adapter (feature `highs`)
// Translates the assignment model directly to the HiGHS API. Supports the
// wall-clock budget through the `time_limit` option; a run stopped at the
// limit yields the incumbent with FeasibleTimeout status.

use crate::domain::{
    models::{Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus},
};
use crate::model::{AssignmentModel, VarKind};
use std::time::{Duration, Instant};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, model: &AssignmentModel, time_budget: Duration) -> Result<DomainSolution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        use highs::{HighsModelStatus, RowProblem, Sense};

        // Dense objective coefficients per registered variable.
        let mut obj_coeffs = vec![0.0; model.num_variables()];
        for &(id, coeff) in &model.objective.terms {
            obj_coeffs[id.index()] += coeff;
        }

        // Use HiGHS RowProblem (add variables first, then constraints)
        let mut pb = RowProblem::default();
        let mut vars = Vec::with_capacity(model.num_variables());

        for (id, key) in model.registry.iter() {
            let coeff = obj_coeffs[id.index()];
            let col = match key.kind() {
                VarKind::Binary => pb.add_integer_column(coeff, 0.0..=1.0),
                VarKind::NonNegative => pb.add_column(coeff, 0.0..),
            };
            vars.push(col);
        }

        for constraint in &model.constraints {
            let mut terms = Vec::with_capacity(constraint.terms.len());
            for &(id, coeff) in &constraint.terms {
                if coeff != 0.0 {
                    terms.push((vars[id.index()], coeff));
                }
            }

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let sense = if model.objective.optimization_type == OptimizationType::Maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };

        let mut highs_model = pb.optimise(sense);
        highs_model.set_option("time_limit", time_budget.as_secs_f64());

        let solved = highs_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;

        let statistics = SolverStatistics {
            solve_time_ms: solve_time,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_binary_vars: model.registry.num_binary() as u32,
            num_continuous_vars: model.registry.num_continuous() as u32,
        };

        match solved.status() {
            HighsModelStatus::Optimal => {
                let solution_data = solved.get_solution();
                let variable_values = solution_data.columns().to_vec();
                let objective_value = model.objective.evaluate(&variable_values);

                let mut solution = DomainSolution::optimal(objective_value, variable_values);
                solution.statistics = statistics;
                Ok(solution)
            }
            HighsModelStatus::ReachedTimeLimit => {
                let solution_data = solved.get_solution();
                let variable_values = solution_data.columns().to_vec();
                let objective_value = model.objective.evaluate(&variable_values);

                let mut solution = DomainSolution::incumbent(objective_value, variable_values);
                solution.statistics = statistics;
                Ok(solution)
            }
            HighsModelStatus::Infeasible => {
                let mut solution = DomainSolution::new(
                    SolutionStatus::Infeasible,
                    "Model is infeasible: no assignment satisfies all hard constraints",
                );
                solution.statistics = statistics;
                Ok(solution)
            }
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                let mut solution = DomainSolution::new(
                    SolutionStatus::Unbounded,
                    "Model is unbounded: objective can be improved infinitely",
                );
                solution.statistics = statistics;
                Ok(solution)
            }
            status => Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {:?}",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
