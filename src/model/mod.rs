// Assignment model: decision variables, linear constraints, and the
// objective built from normalized scheduling data. A derived, disposable
// artifact rebuilt from the input entities each run.

pub mod builder;
pub mod registry;

pub use builder::{ModelBuilder, ModelConfig};
pub use registry::{VarId, VarKey, VarKind, VariableRegistry};

use crate::domain::{ConstraintType, OptimizationType, StudentRequest};

/// Linear constraint over registered variables: a sparse sum of weighted
/// variables compared to a bound. This, together with the variable set and
/// one linear objective, is the entire surface a solving engine must support.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub terms: Vec<(VarId, f64)>,
    pub bound: f64,
}

impl LinearConstraint {
    pub fn new(constraint_type: ConstraintType, terms: Vec<(VarId, f64)>, bound: f64) -> Self {
        Self {
            name: String::new(),
            constraint_type,
            terms,
            bound,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Linear objective as a sparse sum of weighted variables.
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub terms: Vec<(VarId, f64)>,
}

impl ObjectiveFunction {
    pub fn maximize(terms: Vec<(VarId, f64)>) -> Self {
        Self {
            optimization_type: OptimizationType::Maximize,
            terms,
        }
    }

    /// Evaluates the objective under a valuation indexed by `VarId`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(id, coeff)| coeff * values.get(id.index()).copied().unwrap_or(0.0))
            .sum()
    }
}

/// The full optimization model for one scheduling run.
#[derive(Debug, Clone)]
pub struct AssignmentModel {
    pub registry: VariableRegistry,
    pub constraints: Vec<LinearConstraint>,
    pub objective: ObjectiveFunction,
    /// Required requests with no candidate enrollment variable at all. The
    /// mandatory-coverage constraint set is unsatisfiable as declared; these
    /// are surfaced instead of handing the solver a trivially empty
    /// constraint, and the rest of the model is still solved best-effort.
    pub unsatisfiable_required: Vec<StudentRequest>,
}

impl AssignmentModel {
    pub fn num_variables(&self) -> usize {
        self.registry.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_structurally_infeasible(&self) -> bool {
        !self.unsatisfiable_required.is_empty()
    }
}
