// Structured diagnostics for recoverable data problems.
//
// Partial schedules are still valuable, so inconsistent records are excluded
// and reported instead of aborting the run (the offending record is named so
// operators can correct the source data).

use super::value_objects::{Block, CourseCode, Priority, ProfessorId, StudentId};
use serde::Serialize;

/// A recoverable inconsistency detected while normalizing input data or
/// interpreting a solution. Attached to the run output, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum Diagnostic {
    #[error("lecturer record for professor {professor} references unknown course {course}")]
    UnknownCourseInLecturerRecord {
        professor: ProfessorId,
        course: CourseCode,
    },

    #[error("request from student {student} references unknown course {course}")]
    UnknownCourseInRequest {
        student: StudentId,
        course: CourseCode,
    },

    #[error("lecturer record for professor {professor} on course {course} has no section number")]
    MissingSectionNumber {
        professor: ProfessorId,
        course: CourseCode,
    },

    #[error("student {student} requested course {course} more than once; kept {kept} tier")]
    DuplicateRequest {
        student: StudentId,
        course: CourseCode,
        kept: Priority,
    },

    #[error("course {course} lists block {block} as both available and unavailable")]
    BlockListedAvailableAndUnavailable { course: CourseCode, block: Block },

    #[error(
        "course {course} has inconsistent section sizes \
         (min {minimum}, target {target}, max {maximum})"
    )]
    InvalidSectionSizes {
        course: CourseCode,
        minimum: u32,
        target: u32,
        maximum: u32,
    },

    #[error(
        "course {course} declares {declared} sections but lecturer data provides {provided}"
    )]
    SectionCountMismatch {
        course: CourseCode,
        declared: u32,
        provided: u32,
    },

    #[error(
        "required request of student {student} for course {course} has no feasible \
         section/block assignment"
    )]
    UnsatisfiableRequired {
        student: StudentId,
        course: CourseCode,
    },

    #[error("solver failed: {message}")]
    SolverFailure { message: String },
}
