//! Model builder.
//!
//! Translates normalized scheduling data into binary decision variables,
//! linear constraints, and a priority-weighted objective. Variables are
//! created only where feasible; any combination not created is implicitly
//! fixed at 0, which bounds the combinatorial size without relaxing
//! correctness. Construction iterates ordered maps throughout, so the
//! resulting constraint set is identical from run to run.

use crate::domain::{Block, ConstraintType, SectionId, StudentId, StudentRequest};
use crate::model::{
    AssignmentModel, LinearConstraint, ObjectiveFunction, VarId, VarKey, VariableRegistry,
};
use crate::normalize::NormalizedData;
use itertools::Itertools;
use log::{info, warn};
use std::collections::BTreeMap;

/// Tunables for model construction.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Objective penalty per unit of same-course section-size imbalance.
    ///
    /// Must stay strictly below the smallest priority weight (1) divided by
    /// the largest plausible total imbalance, so that balancing can never
    /// trade away a single fulfilled request. The default of 0.01 keeps the
    /// penalty two orders of magnitude under the objective scale of typical
    /// cohorts; it is a tunable, not a behavioral contract.
    pub balance_penalty: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            balance_penalty: 0.01,
        }
    }
}

pub struct ModelBuilder;

impl ModelBuilder {
    /// Builds the full assignment model for one run.
    pub fn build(data: &NormalizedData, config: &ModelConfig) -> AssignmentModel {
        if config.balance_penalty >= 1.0 {
            warn!(
                "balance penalty {} is not dominated by the minimum priority weight; \
                 balancing may now trade away fulfillments",
                config.balance_penalty
            );
        }

        let mut b = Builder {
            data,
            config,
            registry: VariableRegistry::new(),
            constraints: Vec::new(),
            enroll_by_request: BTreeMap::new(),
            enroll_by_student_block: BTreeMap::new(),
            enroll_by_section_block: BTreeMap::new(),
            teach_by_professor_block: BTreeMap::new(),
            teach_by_section_block: BTreeMap::new(),
            imbalance_vars: Vec::new(),
        };

        b.create_enrollment_variables();
        b.create_teaching_variables();
        b.create_usage_variables_and_links();
        b.create_exclusivity_constraints();
        let unsatisfiable_required = b.create_required_coverage();
        b.create_balance_constraints();
        let objective = b.build_objective();

        info!(
            "built assignment model: {} variables, {} constraints, {} unsatisfiable required requests",
            b.registry.len(),
            b.constraints.len(),
            unsatisfiable_required.len()
        );

        AssignmentModel {
            registry: b.registry,
            constraints: b.constraints,
            objective,
            unsatisfiable_required,
        }
    }
}

type CourseKey = crate::domain::CourseCode;

struct Builder<'a> {
    data: &'a NormalizedData,
    config: &'a ModelConfig,
    registry: VariableRegistry,
    constraints: Vec<LinearConstraint>,
    enroll_by_request: BTreeMap<(StudentId, CourseKey), Vec<VarId>>,
    enroll_by_student_block: BTreeMap<(StudentId, Block), Vec<VarId>>,
    enroll_by_section_block: BTreeMap<(SectionId, Block), Vec<VarId>>,
    teach_by_professor_block: BTreeMap<(crate::domain::ProfessorId, Block), Vec<VarId>>,
    teach_by_section_block: BTreeMap<(SectionId, Block), Vec<VarId>>,
    imbalance_vars: Vec<VarId>,
}

impl Builder<'_> {
    /// `enroll[student, section, block]`: only for requested courses, open
    /// blocks, and sections that have at least one qualified professor.
    fn create_enrollment_variables(&mut self) {
        for (student, courses) in &self.data.requests {
            for course in courses.keys() {
                let Some(open) = self.data.open_blocks(course) else {
                    continue;
                };
                let sections = self.data.course_sections.get(course);
                for section_id in sections.into_iter().flatten() {
                    let section = &self.data.sections[section_id];
                    if section.qualified_professors.is_empty() {
                        continue;
                    }
                    for block in open {
                        let id = self.registry.intern(VarKey::Enroll {
                            student: student.clone(),
                            section: section_id.clone(),
                            block: block.clone(),
                        });
                        self.enroll_by_request
                            .entry((student.clone(), course.clone()))
                            .or_default()
                            .push(id);
                        self.enroll_by_student_block
                            .entry((student.clone(), block.clone()))
                            .or_default()
                            .push(id);
                        self.enroll_by_section_block
                            .entry((section_id.clone(), block.clone()))
                            .or_default()
                            .push(id);
                    }
                }
            }
        }
    }

    /// `teach[professor, section, block]`: only for qualified professors,
    /// restricted to the course's open blocks.
    fn create_teaching_variables(&mut self) {
        for (section_id, section) in &self.data.sections {
            let Some(open) = self.data.open_blocks(&section_id.course) else {
                continue;
            };
            for professor in &section.qualified_professors {
                for block in open {
                    let id = self.registry.intern(VarKey::Teach {
                        professor: professor.clone(),
                        section: section_id.clone(),
                        block: block.clone(),
                    });
                    self.teach_by_professor_block
                        .entry((professor.clone(), block.clone()))
                        .or_default()
                        .push(id);
                    self.teach_by_section_block
                        .entry((section_id.clone(), block.clone()))
                        .or_default()
                        .push(id);
                }
            }
        }
    }

    /// `used[section, block]` for every open (section, block) pair, linked
    /// to enrollment through the size bounds and to teaching through the
    /// single-professor equality.
    fn create_usage_variables_and_links(&mut self) {
        for section_id in self.data.sections.keys() {
            let course = &self.data.courses[&section_id.course];
            let mut used_vars = Vec::new();
            for block in &course.available_blocks {
                let used = self.registry.intern(VarKey::Used {
                    section: section_id.clone(),
                    block: block.clone(),
                });
                used_vars.push(used);

                let enrollment = self
                    .enroll_by_section_block
                    .get(&(section_id.clone(), block.clone()))
                    .cloned()
                    .unwrap_or_default();

                // used = 0 forces enrollment to 0; used = 1 forces it into
                // [minimum, maximum].
                let mut min_terms: Vec<(VarId, f64)> =
                    enrollment.iter().map(|&v| (v, 1.0)).collect();
                min_terms.push((used, -f64::from(course.minimum_section_size)));
                self.constraints.push(
                    LinearConstraint::new(ConstraintType::GreaterThanOrEqual, min_terms, 0.0)
                        .with_name(format!("min_size[{section_id}, {block}]")),
                );

                let mut max_terms: Vec<(VarId, f64)> =
                    enrollment.iter().map(|&v| (v, 1.0)).collect();
                max_terms.push((used, -f64::from(course.maximum_section_size)));
                self.constraints.push(
                    LinearConstraint::new(ConstraintType::LessThanOrEqual, max_terms, 0.0)
                        .with_name(format!("max_size[{section_id}, {block}]")),
                );

                // A used section has exactly one professor; an unused one
                // has none.
                let mut teach_terms: Vec<(VarId, f64)> = self
                    .teach_by_section_block
                    .get(&(section_id.clone(), block.clone()))
                    .into_iter()
                    .flatten()
                    .map(|&v| (v, 1.0))
                    .collect();
                teach_terms.push((used, -1.0));
                self.constraints.push(
                    LinearConstraint::new(ConstraintType::Equal, teach_terms, 0.0)
                        .with_name(format!("single_professor[{section_id}, {block}]")),
                );
            }

            // A solved section meets in at most one block.
            if !used_vars.is_empty() {
                let terms = used_vars.iter().map(|&v| (v, 1.0)).collect();
                self.constraints.push(
                    LinearConstraint::new(ConstraintType::LessThanOrEqual, terms, 1.0)
                        .with_name(format!("single_block[{section_id}]")),
                );
            }
        }
    }

    /// At most one enrollment per (student, course) across all sections and
    /// blocks, plus per-student and per-professor block exclusivity. Without
    /// the per-course cap a student could hold several sections of one course
    /// and collect its priority weight once per seat.
    fn create_exclusivity_constraints(&mut self) {
        for ((student, course), vars) in &self.enroll_by_request {
            let terms = vars.iter().map(|&v| (v, 1.0)).collect();
            self.constraints.push(
                LinearConstraint::new(ConstraintType::LessThanOrEqual, terms, 1.0)
                    .with_name(format!("one_section_per_course[{student}, {course}]")),
            );
        }
        for ((student, block), vars) in &self.enroll_by_student_block {
            let terms = vars.iter().map(|&v| (v, 1.0)).collect();
            self.constraints.push(
                LinearConstraint::new(ConstraintType::LessThanOrEqual, terms, 1.0)
                    .with_name(format!("one_section_per_block[{student}, {block}]")),
            );
        }
        for ((professor, block), vars) in &self.teach_by_professor_block {
            let terms = vars.iter().map(|&v| (v, 1.0)).collect();
            self.constraints.push(
                LinearConstraint::new(ConstraintType::LessThanOrEqual, terms, 1.0)
                    .with_name(format!("one_assignment_per_block[{professor}, {block}]")),
            );
        }
    }

    /// Hard coverage for Required requests. A Required request with no
    /// candidate enrollment variable at all cannot be expressed as a
    /// satisfiable constraint; it is returned for the caller to surface.
    fn create_required_coverage(&mut self) -> Vec<StudentRequest> {
        let mut unsatisfiable = Vec::new();
        for request in self.data.required_requests() {
            let key = (request.student.clone(), request.course.clone());
            match self.enroll_by_request.get(&key) {
                Some(vars) if !vars.is_empty() => {
                    let terms = vars.iter().map(|&v| (v, 1.0)).collect();
                    self.constraints.push(
                        LinearConstraint::new(ConstraintType::GreaterThanOrEqual, terms, 1.0)
                            .with_name(format!(
                                "required_coverage[{}, {}]",
                                request.student, request.course
                            )),
                    );
                }
                _ => unsatisfiable.push(request),
            }
        }
        unsatisfiable
    }

    /// Soft balancing between same-course sections meeting in the same
    /// block: a non-negative slack bounds the absolute enrollment gap from
    /// above and is penalized in the objective. The slack is relaxed by the
    /// maximum section size for each section not meeting in the block, so a
    /// pair split across blocks is never charged for its full sizes.
    fn create_balance_constraints(&mut self) {
        for sections in self.data.course_sections.values() {
            for (a, b) in sections.iter().sorted().tuple_combinations() {
                let course = &self.data.courses[&a.course];
                let relax = f64::from(course.maximum_section_size);
                for block in &course.available_blocks {
                    let gap = self.registry.intern(VarKey::Imbalance {
                        first: a.clone(),
                        second: b.clone(),
                        block: block.clone(),
                    });
                    self.imbalance_vars.push(gap);

                    let used_a = self.registry.intern(VarKey::Used {
                        section: a.clone(),
                        block: block.clone(),
                    });
                    let used_b = self.registry.intern(VarKey::Used {
                        section: b.clone(),
                        block: block.clone(),
                    });

                    let size_a = self
                        .enroll_by_section_block
                        .get(&(a.clone(), block.clone()))
                        .cloned()
                        .unwrap_or_default();
                    let size_b = self
                        .enroll_by_section_block
                        .get(&(b.clone(), block.clone()))
                        .cloned()
                        .unwrap_or_default();

                    // gap >= size(a) - size(b) - relax * (2 - used(a) - used(b))
                    let mut fwd: Vec<(VarId, f64)> =
                        vec![(gap, 1.0), (used_a, -relax), (used_b, -relax)];
                    fwd.extend(size_a.iter().map(|&v| (v, -1.0)));
                    fwd.extend(size_b.iter().map(|&v| (v, 1.0)));
                    self.constraints.push(
                        LinearConstraint::new(
                            ConstraintType::GreaterThanOrEqual,
                            fwd,
                            -2.0 * relax,
                        )
                        .with_name(format!("balance_gap[{a}-{b}, {block}]")),
                    );

                    // gap >= size(b) - size(a) - relax * (2 - used(a) - used(b))
                    let mut rev: Vec<(VarId, f64)> =
                        vec![(gap, 1.0), (used_a, -relax), (used_b, -relax)];
                    rev.extend(size_b.iter().map(|&v| (v, -1.0)));
                    rev.extend(size_a.iter().map(|&v| (v, 1.0)));
                    self.constraints.push(
                        LinearConstraint::new(
                            ConstraintType::GreaterThanOrEqual,
                            rev,
                            -2.0 * relax,
                        )
                        .with_name(format!("balance_gap[{b}-{a}, {block}]")),
                    );
                }
            }
        }
    }

    /// Maximize priority-weighted fulfillment minus the (dominated) balance
    /// penalty.
    fn build_objective(&self) -> ObjectiveFunction {
        let mut terms = Vec::new();
        for ((student, course), vars) in &self.enroll_by_request {
            let weight = self
                .data
                .priority(student, course)
                .map(|p| p.weight())
                .unwrap_or(0.0);
            for &v in vars {
                terms.push((v, weight));
            }
        }
        for &v in &self.imbalance_vars {
            terms.push((v, -self.config.balance_penalty));
        }
        ObjectiveFunction::maximize(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CourseCode, OptimizationType, Priority};
    use crate::normalize::{CourseRecord, LecturerRecord, Normalizer, RequestRecord};

    fn course(code: &str, blocks: &[&str], min: u32, max: u32, sections: u32) -> CourseRecord {
        CourseRecord {
            course_code: code.to_string(),
            title: code.to_string(),
            length: 1,
            priority: None,
            available_blocks: blocks.iter().map(|b| b.to_string()).collect(),
            unavailable_blocks: vec![],
            minimum_section_size: min,
            target_section_size: min.max(1),
            maximum_section_size: max,
            number_of_sections: sections,
            total_credits: 4,
        }
    }

    fn lecturer(code: &str, section: u32, prof: &str) -> LecturerRecord {
        LecturerRecord {
            course_code: code.to_string(),
            section_number: Some(section),
            professor_id: prof.to_string(),
            start_term: None,
            term_name: None,
        }
    }

    fn request(student: &str, code: &str, tier: Priority) -> RequestRecord {
        RequestRecord {
            student_id: student.to_string(),
            course_code: code.to_string(),
            request_type: tier,
        }
    }

    fn fixture() -> crate::normalize::NormalizedData {
        Normalizer::normalize(
            &[
                course("math101", &["A", "B"], 1, 10, 2),
                course("bio2", &["A"], 1, 10, 1),
            ],
            &[
                lecturer("math101", 1, "p1"),
                lecturer("math101", 2, "p2"),
                lecturer("bio2", 1, "p1"),
            ],
            &[
                request("s1", "math101", Priority::Required),
                request("s2", "math101", Priority::Requested),
                request("s2", "bio2", Priority::Recommended),
            ],
        )
    }

    fn constraint<'a>(model: &'a AssignmentModel, name: &str) -> &'a LinearConstraint {
        model
            .constraints
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("missing constraint {name}"))
    }

    #[test]
    fn variables_are_created_only_where_feasible() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let reg = &model.registry;

        // s1 requested only math101: 2 sections x 2 blocks.
        let s1_enrolls = reg
            .iter()
            .filter(|(_, k)| {
                matches!(k, VarKey::Enroll { student, .. } if student.as_str() == "s1")
            })
            .count();
        assert_eq!(s1_enrolls, 4);

        // No enrollment of s1 in bio2 exists; it is structurally zero.
        let bio = SectionId::new(CourseCode::canonical("bio2"), 1);
        assert_eq!(
            reg.get(&VarKey::Enroll {
                student: StudentId::new("s1"),
                section: bio.clone(),
                block: Block::new("A"),
            }),
            None
        );

        // bio2 is not open in block B: no usage indicator there.
        assert_eq!(
            reg.get(&VarKey::Used {
                section: bio,
                block: Block::new("B"),
            }),
            None
        );

        // teach: one professor per math section over 2 blocks, plus bio2.
        let teaches = reg
            .iter()
            .filter(|(_, k)| matches!(k, VarKey::Teach { .. }))
            .count();
        assert_eq!(teaches, 5);

        // used: every open (section, block) pair.
        let used = reg
            .iter()
            .filter(|(_, k)| matches!(k, VarKey::Used { .. }))
            .count();
        assert_eq!(used, 5);

        // imbalance: the math101 pair in each shared block.
        let gaps = reg
            .iter()
            .filter(|(_, k)| matches!(k, VarKey::Imbalance { .. }))
            .count();
        assert_eq!(gaps, 2);
    }

    #[test]
    fn objective_weights_match_priority_tiers() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let weight_of = |student: &str, course: &str| -> Vec<f64> {
            model
                .objective
                .terms
                .iter()
                .filter(|(id, _)| {
                    matches!(
                        model.registry.key(*id),
                        VarKey::Enroll { student: s, section, .. }
                            if s.as_str() == student && section.course.as_str() == course
                    )
                })
                .map(|&(_, w)| w)
                .collect()
        };
        assert!(weight_of("s1", "math101").iter().all(|&w| w == 3.0));
        assert!(weight_of("s2", "math101").iter().all(|&w| w == 2.0));
        assert!(weight_of("s2", "bio2").iter().all(|&w| w == 1.0));
        assert_eq!(model.objective.optimization_type, OptimizationType::Maximize);

        // Imbalance terms carry the small negative penalty.
        let penalties: Vec<f64> = model
            .objective
            .terms
            .iter()
            .filter(|(id, _)| matches!(model.registry.key(*id), VarKey::Imbalance { .. }))
            .map(|&(_, w)| w)
            .collect();
        assert_eq!(penalties, vec![-0.01, -0.01]);
    }

    #[test]
    fn size_bounds_are_linked_to_usage() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let min = constraint(&model, "min_size[math101_1, A]");
        assert_eq!(min.constraint_type, ConstraintType::GreaterThanOrEqual);
        assert_eq!(min.bound, 0.0);
        // Two potential enrollees plus the -min * used term.
        assert_eq!(min.terms.len(), 3);
        assert!(min.terms.iter().any(|&(_, c)| c == -1.0));

        let max = constraint(&model, "max_size[math101_1, A]");
        assert_eq!(max.constraint_type, ConstraintType::LessThanOrEqual);
        assert!(max.terms.iter().any(|&(_, c)| c == -10.0));
    }

    #[test]
    fn used_section_requires_exactly_one_professor() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let c = constraint(&model, "single_professor[bio2_1, A]");
        assert_eq!(c.constraint_type, ConstraintType::Equal);
        assert_eq!(c.bound, 0.0);
        assert_eq!(c.terms.len(), 2); // one teach var, minus used
    }

    #[test]
    fn exclusivity_constraints_cover_each_entity_block() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        // s2 can sit in math101_1, math101_2, or bio2_1 in block A.
        let c = constraint(&model, "one_section_per_block[s2, A]");
        assert_eq!(c.constraint_type, ConstraintType::LessThanOrEqual);
        assert_eq!(c.bound, 1.0);
        assert_eq!(c.terms.len(), 3);

        // p1 can teach math101_1 or bio2_1 in block A.
        let p = constraint(&model, "one_assignment_per_block[p1, A]");
        assert_eq!(p.terms.len(), 2);
    }

    #[test]
    fn a_student_holds_at_most_one_section_of_a_requested_course() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        // All of s1's math101 candidates (2 sections x 2 blocks) sum to <= 1,
        // so fulfilling a request can never score its weight twice.
        let c = constraint(&model, "one_section_per_course[s1, math101]");
        assert_eq!(c.constraint_type, ConstraintType::LessThanOrEqual);
        assert_eq!(c.bound, 1.0);
        assert_eq!(c.terms.len(), 4);
        assert!(c.terms.iter().all(|&(_, w)| w == 1.0));

        let single = constraint(&model, "one_section_per_course[s2, bio2]");
        assert_eq!(single.terms.len(), 1);
    }

    #[test]
    fn a_section_meets_in_at_most_one_block() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let c = constraint(&model, "single_block[math101_1]");
        assert_eq!(c.constraint_type, ConstraintType::LessThanOrEqual);
        assert_eq!(c.bound, 1.0);
        assert_eq!(c.terms.len(), 2); // usage indicators for blocks A and B
    }

    #[test]
    fn required_coverage_is_a_hard_constraint() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let c = constraint(&model, "required_coverage[s1, math101]");
        assert_eq!(c.constraint_type, ConstraintType::GreaterThanOrEqual);
        assert_eq!(c.bound, 1.0);
        assert_eq!(c.terms.len(), 4);
        assert!(model.unsatisfiable_required.is_empty());
    }

    #[test]
    fn required_request_without_candidates_is_flagged_not_encoded() {
        // No lecturer rows for the course: no sections, no enroll variables.
        let data = Normalizer::normalize(
            &[course("ghostly", &["A"], 1, 5, 1)],
            &[],
            &[request("s1", "ghostly", Priority::Required)],
        );
        let model = ModelBuilder::build(&data, &ModelConfig::default());
        assert!(model.is_structurally_infeasible());
        assert_eq!(model.unsatisfiable_required.len(), 1);
        assert_eq!(model.unsatisfiable_required[0].student.as_str(), "s1");
        assert!(!model
            .constraints
            .iter()
            .any(|c| c.name.starts_with("required_coverage")));
    }

    #[test]
    fn balance_slack_bounds_the_gap_in_both_directions() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let fwd = constraint(&model, "balance_gap[math101_1-math101_2, A]");
        let rev = constraint(&model, "balance_gap[math101_2-math101_1, A]");
        for c in [fwd, rev] {
            assert_eq!(c.constraint_type, ConstraintType::GreaterThanOrEqual);
            // slack + 2 usage indicators + 2 enrollees per section
            assert_eq!(c.terms.len(), 7);
        }
    }

    #[test]
    fn balance_slack_is_relaxed_when_a_section_skips_the_block() {
        let model = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let c = constraint(&model, "balance_gap[math101_1-math101_2, A]");
        // Each usage indicator carries the max-size relaxation, and the bound
        // absorbs both: a pair split across blocks is never charged.
        assert_eq!(c.bound, -20.0);
        let relaxations = c.terms.iter().filter(|&&(_, w)| w == -10.0).count();
        assert_eq!(relaxations, 2);
    }

    #[test]
    fn construction_is_deterministic() {
        let a = ModelBuilder::build(&fixture(), &ModelConfig::default());
        let b = ModelBuilder::build(&fixture(), &ModelConfig::default());
        assert_eq!(a.num_variables(), b.num_variables());
        let names_a: Vec<_> = a.constraints.iter().map(|c| &c.name).collect();
        let names_b: Vec<_> = b.constraints.iter().map(|c| &c.name).collect();
        assert_eq!(names_a, names_b);
        for (ka, kb) in a.registry.iter().zip(b.registry.iter()) {
            assert_eq!(ka.1, kb.1);
        }
    }
}
