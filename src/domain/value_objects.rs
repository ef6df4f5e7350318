// Domain value objects representing core scheduling concepts

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a student, opaque to the scheduler.
    StudentId
);
id_newtype!(
    /// Identifier of a professor, opaque to the scheduler.
    ProfessorId
);
id_newtype!(
    /// An atomic scheduling time slot. Blocks have no internal structure;
    /// they order lexically for display.
    Block
);

/// Canonical course code. Always lowercase; raw input casing is erased at
/// construction so lookups never depend on source formatting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(String);

impl CourseCode {
    pub fn canonical(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of one offered instance of a course: (course code, section number).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionId {
    pub course: CourseCode,
    pub number: u32,
}

impl SectionId {
    pub fn new(course: CourseCode, number: u32) -> Self {
        Self { course, number }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.course, self.number)
    }
}

/// Priority tier of a student course request.
///
/// Variants are declared in ascending order so `Ord` ranks Required highest;
/// duplicate requests for the same course keep the higher tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Recommended,
    Requested,
    Required,
}

impl Priority {
    /// Objective weight of a fulfilled request in this tier.
    pub fn weight(self) -> f64 {
        match self {
            Priority::Required => 3.0,
            Priority::Requested => 2.0,
            Priority::Recommended => 1.0,
        }
    }

    pub const ALL: [Priority; 3] = [
        Priority::Required,
        Priority::Requested,
        Priority::Recommended,
    ];
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Required => write!(f, "Required"),
            Priority::Requested => write!(f, "Requested"),
            Priority::Recommended => write!(f, "Recommended"),
        }
    }
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Status of a solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionStatus {
    /// Found a provably optimal solution
    Optimal,
    /// Time budget expired; best incumbent returned without an optimality proof
    FeasibleTimeout,
    /// The hard constraints cannot be simultaneously satisfied
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Solver error occurred
    Error,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::FeasibleTimeout => write!(f, "Feasible (time budget reached)"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::Error => write!(f, "Error"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverBackend {
    /// Automatically select the best available solver
    Auto,
    /// Pure-Rust microlp solver (always available)
    Microlp,
    /// COIN-OR CBC solver (requires the `coin_cbc` feature)
    CoinCbc,
    /// HiGHS solver (requires the `highs` feature)
    Highs,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::Microlp => write!(f, "microlp"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
            SolverBackend::Highs => write!(f, "HiGHS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_codes_are_canonicalized() {
        assert_eq!(
            CourseCode::canonical("  MATH101 "),
            CourseCode::canonical("math101")
        );
        assert_eq!(CourseCode::canonical("BIO2").as_str(), "bio2");
    }

    #[test]
    fn priority_weights_are_exact() {
        assert_eq!(Priority::Required.weight(), 3.0);
        assert_eq!(Priority::Requested.weight(), 2.0);
        assert_eq!(Priority::Recommended.weight(), 1.0);
    }

    #[test]
    fn priority_orders_required_highest() {
        assert!(Priority::Required > Priority::Requested);
        assert!(Priority::Requested > Priority::Recommended);
    }

    #[test]
    fn section_id_displays_course_and_number() {
        let id = SectionId::new(CourseCode::canonical("Math101"), 2);
        assert_eq!(id.to_string(), "math101_2");
    }
}
