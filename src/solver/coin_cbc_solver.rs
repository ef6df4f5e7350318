// COIN-OR CBC Solver Adapter (feature `coin_cbc`)
// Branch-and-bound backend with real time-budget support: the budget is
// passed to CBC, and a feasible result produced at the budget edge is
// reported as an incumbent rather than a proven optimum.

use crate::domain::{
    models::{Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus},
};
use crate::model::{AssignmentModel, VarKind};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use std::time::{Duration, Instant};

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, model: &AssignmentModel, time_budget: Duration) -> Result<DomainSolution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        // Build variables using good_lp
        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(model.num_variables());

        for (_, key) in model.registry.iter() {
            let var = match key.kind() {
                VarKind::Binary => vars.add(variable().integer().min(0.0).max(1.0)),
                VarKind::NonNegative => vars.add(variable().min(0.0)),
            };
            lp_variables.push(var);
        }

        // good_lp minimizes, so negate for maximization
        let is_maximize = model.objective.optimization_type == OptimizationType::Maximize;
        let mut obj_expr: Expression = 0.into();
        for &(id, coeff) in &model.objective.terms {
            if coeff != 0.0 {
                let c = if is_maximize { -coeff } else { coeff };
                obj_expr += c * lp_variables[id.index()];
            }
        }

        let mut lp_model = vars.minimise(obj_expr).using(coin_cbc::coin_cbc);

        for constraint in &model.constraints {
            let mut lhs: Expression = 0.into();
            for &(id, coeff) in &constraint.terms {
                if coeff != 0.0 {
                    lhs += coeff * lp_variables[id.index()];
                }
            }

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    lp_model = lp_model.with(lhs.leq(constraint.bound));
                }
                ConstraintType::Equal => {
                    lp_model = lp_model.with(lhs.eq(constraint.bound));
                }
                ConstraintType::GreaterThanOrEqual => {
                    lp_model = lp_model.with(lhs.geq(constraint.bound));
                }
            }
        }

        // CBC takes the budget in seconds and returns its best incumbent
        // when it expires.
        lp_model.set_parameter("sec", &time_budget.as_secs_f64().to_string());

        let solution_result = lp_model.solve();
        let solve_time = start_time.elapsed();

        let statistics = SolverStatistics {
            solve_time_ms: solve_time.as_secs_f64() * 1000.0,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_binary_vars: model.registry.num_binary() as u32,
            num_continuous_vars: model.registry.num_continuous() as u32,
        };

        match solution_result {
            Ok(sol) => {
                let mut variable_values = vec![0.0; model.num_variables()];
                for (i, &var) in lp_variables.iter().enumerate() {
                    variable_values[i] = sol.value(var);
                }

                let objective_value = model.objective.evaluate(&variable_values);

                // A result arriving at the budget edge carries no optimality
                // proof; report it as an incumbent.
                let mut solution = if solve_time >= time_budget {
                    DomainSolution::incumbent(objective_value, variable_values)
                } else {
                    DomainSolution::optimal(objective_value, variable_values)
                };
                solution.statistics = statistics;
                Ok(solution)
            }
            Err(ResolutionError::Infeasible) => {
                let mut solution = DomainSolution::new(
                    SolutionStatus::Infeasible,
                    "Model is infeasible: no assignment satisfies all hard constraints",
                );
                solution.statistics = statistics;
                Ok(solution)
            }
            Err(ResolutionError::Unbounded) => {
                let mut solution = DomainSolution::new(
                    SolutionStatus::Unbounded,
                    "Model is unbounded: objective can be improved infinitely",
                );
                solution.statistics = statistics;
                Ok(solution)
            }
            Err(e) => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
