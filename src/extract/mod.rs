//! Schedule extractor.
//!
//! Decodes a solver valuation into per-student and per-professor schedules
//! and fulfillment statistics. Extraction is a pure projection of the
//! solution: re-running it yields identical output, and nothing here mutates
//! the model or the valuation. Variable values are rounded to the nearest
//! integer before interpretation, tolerating solver values close to but not
//! exactly 0/1.

use crate::domain::{
    Block, CourseCode, Priority, ProfessorId, SectionId, Solution, SolutionStatus, StudentId,
};
use crate::model::{AssignmentModel, VarKey};
use crate::normalize::NormalizedData;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;

/// One line of a student's schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentScheduleEntry {
    pub course: CourseCode,
    pub title: String,
    pub section: u32,
    pub block: Block,
    /// Professor teaching the section, decoded from the same valuation.
    /// Absent only if the solver returned a valuation violating the
    /// single-professor constraint, which is reported, not guessed at.
    pub professor: Option<ProfessorId>,
}

/// One line of a professor's schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessorScheduleEntry {
    pub course: CourseCode,
    pub title: String,
    pub section: u32,
    pub block: Block,
}

pub type StudentSchedules = BTreeMap<StudentId, Vec<StudentScheduleEntry>>;
pub type ProfessorSchedules = BTreeMap<ProfessorId, Vec<ProfessorScheduleEntry>>;

/// Fulfillment counts for one priority tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TierStats {
    pub fulfilled: usize,
    pub total: usize,
}

impl TierStats {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * self.fulfilled as f64 / self.total as f64
        }
    }
}

/// Fulfillment statistics for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FulfillmentStats {
    pub status: SolutionStatus,
    /// False for timed-out incumbents: the schedules are valid but may be
    /// improvable; operators should know the answer carries no proof.
    pub proven_optimal: bool,
    pub objective_value: Option<f64>,
    /// Sum of priority weights over fulfilled requests, recomputed from the
    /// schedules rather than read off the solver.
    pub fulfilled_weight: f64,
    /// Realized section-balance penalty (non-negative, strictly dominated by
    /// the priority weights).
    pub imbalance_penalty: f64,
    pub by_tier: BTreeMap<Priority, TierStats>,
}

/// A Required request that the solution does not fulfill: the student is
/// either absent from scheduling entirely or scheduled without that course.
/// This list is the primary actionable failure signal of the whole system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmetRequired {
    pub student: StudentId,
    pub course: CourseCode,
}

/// Everything decoded from one solution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSchedules {
    pub students: StudentSchedules,
    pub professors: ProfessorSchedules,
    pub stats: FulfillmentStats,
    pub unmet_required: Vec<UnmetRequired>,
}

pub struct ScheduleExtractor;

impl ScheduleExtractor {
    pub fn extract(
        model: &AssignmentModel,
        solution: &Solution,
        data: &NormalizedData,
    ) -> ExtractedSchedules {
        let mut students = StudentSchedules::new();
        let mut professors = ProfessorSchedules::new();

        if solution.is_feasible() {
            // Teaching assignments first, so student entries can name the
            // professor of their (section, block).
            let mut section_professor: BTreeMap<(SectionId, Block), ProfessorId> = BTreeMap::new();
            for (id, key) in model.registry.iter() {
                let VarKey::Teach {
                    professor,
                    section,
                    block,
                } = key
                else {
                    continue;
                };
                if solution.rounded_value(id.index()) != 1 {
                    continue;
                }
                section_professor
                    .insert((section.clone(), block.clone()), professor.clone());
                professors
                    .entry(professor.clone())
                    .or_default()
                    .push(ProfessorScheduleEntry {
                        course: section.course.clone(),
                        title: Self::title(data, &section.course),
                        section: section.number,
                        block: block.clone(),
                    });
            }

            for (id, key) in model.registry.iter() {
                let VarKey::Enroll {
                    student,
                    section,
                    block,
                } = key
                else {
                    continue;
                };
                if solution.rounded_value(id.index()) != 1 {
                    continue;
                }
                let professor = section_professor
                    .get(&(section.clone(), block.clone()))
                    .cloned();
                if professor.is_none() {
                    warn!(
                        "solution enrolls {student} in {section} ({block}) with no professor assigned"
                    );
                }
                students
                    .entry(student.clone())
                    .or_default()
                    .push(StudentScheduleEntry {
                        course: section.course.clone(),
                        title: Self::title(data, &section.course),
                        section: section.number,
                        block: block.clone(),
                        professor,
                    });
            }

            for entries in students.values_mut() {
                entries.sort_by(|a, b| {
                    (&a.block, &a.course, a.section).cmp(&(&b.block, &b.course, b.section))
                });
            }
            for entries in professors.values_mut() {
                entries.sort_by(|a, b| {
                    (&a.block, &a.course, a.section).cmp(&(&b.block, &b.course, b.section))
                });
            }
        }

        let (stats, unmet_required) = Self::statistics(model, solution, data, &students);

        ExtractedSchedules {
            students,
            professors,
            stats,
            unmet_required,
        }
    }

    fn title(data: &NormalizedData, course: &CourseCode) -> String {
        data.courses
            .get(course)
            .map(|c| c.title.clone())
            .unwrap_or_default()
    }

    /// Per-tier fulfillment counts plus the unmet-Required list. For every
    /// Required request, exactly one of "course appears in the student's
    /// schedule" and "request listed as unmet" holds.
    fn statistics(
        model: &AssignmentModel,
        solution: &Solution,
        data: &NormalizedData,
        students: &StudentSchedules,
    ) -> (FulfillmentStats, Vec<UnmetRequired>) {
        let mut by_tier: BTreeMap<Priority, TierStats> = Priority::ALL
            .iter()
            .map(|&p| (p, TierStats::default()))
            .collect();
        let mut fulfilled_weight = 0.0;
        let mut unmet_required = Vec::new();

        for request in data.all_requests() {
            let tier = by_tier.entry(request.priority).or_default();
            tier.total += 1;

            let fulfilled = students
                .get(&request.student)
                .is_some_and(|entries| entries.iter().any(|e| e.course == request.course));
            if fulfilled {
                tier.fulfilled += 1;
                fulfilled_weight += request.priority.weight();
            } else if request.priority == Priority::Required {
                unmet_required.push(UnmetRequired {
                    student: request.student,
                    course: request.course,
                });
            }
        }

        let imbalance_penalty = if solution.is_feasible() {
            -model
                .objective
                .terms
                .iter()
                .filter(|(id, _)| matches!(model.registry.key(*id), VarKey::Imbalance { .. }))
                .map(|&(id, coeff)| {
                    coeff * solution.variable_values.get(id.index()).copied().unwrap_or(0.0)
                })
                .sum::<f64>()
        } else {
            0.0
        };

        let stats = FulfillmentStats {
            status: solution.status,
            proven_optimal: solution.is_optimal(),
            objective_value: solution.objective_value,
            fulfilled_weight,
            imbalance_penalty,
            by_tier,
        };
        (stats, unmet_required)
    }
}
