//! Data normalizer.
//!
//! Canonicalizes course codes, derives section identifiers, extracts the
//! block universe, maps request tiers to weights, and builds the lookup
//! indices the model builder consumes. Inconsistent records are excluded
//! and reported as [`Diagnostic`]s; normalization itself never fails, since
//! a partial schedule built from the consistent remainder is still valuable.

pub mod records;

pub use records::{CourseRecord, LecturerRecord, RequestRecord};

use crate::domain::{
    Block, Course, CourseCode, Diagnostic, Priority, Professor, ProfessorId, Section, SectionId,
    StudentId, StudentRequest,
};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// Canonicalized, indexed input data for one scheduling run. Read-only once
/// built; every downstream component takes it as an explicit borrow.
#[derive(Debug, Clone, Default)]
pub struct NormalizedData {
    pub courses: BTreeMap<CourseCode, Course>,
    pub sections: BTreeMap<SectionId, Section>,
    pub professors: BTreeMap<ProfessorId, Professor>,
    /// Per student, the requested courses and their priority tier. At most
    /// one entry per (student, course).
    pub requests: BTreeMap<StudentId, BTreeMap<CourseCode, Priority>>,
    pub course_sections: BTreeMap<CourseCode, Vec<SectionId>>,
    /// Universe of blocks: the deduplicated union of all per-course
    /// available blocks, lexically ordered.
    pub blocks: BTreeSet<Block>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NormalizedData {
    /// Blocks a course may be scheduled in, after unavailable-block cleanup.
    pub fn open_blocks(&self, course: &CourseCode) -> Option<&BTreeSet<Block>> {
        self.courses.get(course).map(|c| &c.available_blocks)
    }

    pub fn priority(&self, student: &StudentId, course: &CourseCode) -> Option<Priority> {
        self.requests.get(student)?.get(course).copied()
    }

    /// All requests, flattened in deterministic (student, course) order.
    pub fn all_requests(&self) -> impl Iterator<Item = StudentRequest> + '_ {
        self.requests.iter().flat_map(|(student, courses)| {
            courses.iter().map(move |(course, &priority)| StudentRequest {
                student: student.clone(),
                course: course.clone(),
                priority,
            })
        })
    }

    pub fn required_requests(&self) -> impl Iterator<Item = StudentRequest> + '_ {
        self.all_requests()
            .filter(|r| r.priority == Priority::Required)
    }
}

pub struct Normalizer;

impl Normalizer {
    /// Normalizes raw course, lecturer, and request records into the
    /// canonical indexed form. Offending records are dropped and reported.
    pub fn normalize(
        courses: &[CourseRecord],
        lecturers: &[LecturerRecord],
        requests: &[RequestRecord],
    ) -> NormalizedData {
        let mut data = NormalizedData::default();

        for record in courses {
            let course = Self::normalize_course(record, &mut data.diagnostics);
            data.blocks.extend(course.available_blocks.iter().cloned());
            data.courses.insert(course.code.clone(), course);
        }

        Self::normalize_lecturers(lecturers, &mut data);
        Self::normalize_requests(requests, &mut data);

        info!(
            "normalized {} courses, {} sections, {} professors, {} students, {} blocks ({} diagnostics)",
            data.courses.len(),
            data.sections.len(),
            data.professors.len(),
            data.requests.len(),
            data.blocks.len(),
            data.diagnostics.len()
        );

        data
    }

    fn normalize_course(record: &CourseRecord, diagnostics: &mut Vec<Diagnostic>) -> Course {
        let code = CourseCode::canonical(&record.course_code);
        let mut available: BTreeSet<Block> = record
            .available_blocks
            .iter()
            .map(|b| Block::new(b.trim()))
            .collect();
        let unavailable: BTreeSet<Block> = record
            .unavailable_blocks
            .iter()
            .map(|b| Block::new(b.trim()))
            .collect();

        // Restore the disjointness invariant: an unavailable block wins.
        for block in available.intersection(&unavailable).cloned().collect::<Vec<_>>() {
            diagnostics.push(Diagnostic::BlockListedAvailableAndUnavailable {
                course: code.clone(),
                block: block.clone(),
            });
            available.remove(&block);
        }

        let mut minimum = record.minimum_section_size;
        let maximum = record.maximum_section_size;
        let mut target = record.target_section_size;
        if minimum > maximum || target < minimum || target > maximum {
            diagnostics.push(Diagnostic::InvalidSectionSizes {
                course: code.clone(),
                minimum,
                target,
                maximum,
            });
            minimum = minimum.min(maximum);
            target = target.clamp(minimum, maximum);
        }

        Course {
            code,
            title: record.title.clone(),
            length: record.length,
            priority_tag: record.priority.clone(),
            available_blocks: available,
            unavailable_blocks: unavailable,
            minimum_section_size: minimum,
            target_section_size: target,
            maximum_section_size: maximum,
            number_of_sections: record.number_of_sections,
            total_credits: record.total_credits,
        }
    }

    fn normalize_lecturers(lecturers: &[LecturerRecord], data: &mut NormalizedData) {
        for record in lecturers {
            let course = CourseCode::canonical(&record.course_code);
            let professor = ProfessorId::new(record.professor_id.trim());

            if !data.courses.contains_key(&course) {
                data.diagnostics
                    .push(Diagnostic::UnknownCourseInLecturerRecord { professor, course });
                continue;
            }
            let Some(number) = record.section_number else {
                data.diagnostics
                    .push(Diagnostic::MissingSectionNumber { professor, course });
                continue;
            };

            let section_id = SectionId::new(course.clone(), number);
            data.sections
                .entry(section_id.clone())
                .or_insert_with(|| Section {
                    id: section_id.clone(),
                    qualified_professors: BTreeSet::new(),
                })
                .qualified_professors
                .insert(professor.clone());
            data.professors
                .entry(professor.clone())
                .or_insert_with(|| Professor {
                    id: professor.clone(),
                    qualified_sections: BTreeSet::new(),
                })
                .qualified_sections
                .insert(section_id.clone());

            let sections = data.course_sections.entry(course).or_default();
            if !sections.contains(&section_id) {
                sections.push(section_id);
            }
        }

        // A course with no lecturer rows at all is the worst mismatch: every
        // request against it is unsatisfiable.
        for (code, course) in &data.courses {
            let provided = data.course_sections.get(code).map_or(0, |s| s.len()) as u32;
            if provided != course.number_of_sections {
                data.diagnostics.push(Diagnostic::SectionCountMismatch {
                    course: code.clone(),
                    declared: course.number_of_sections,
                    provided,
                });
            }
        }
    }

    fn normalize_requests(requests: &[RequestRecord], data: &mut NormalizedData) {
        for record in requests {
            let student = StudentId::new(record.student_id.trim());
            let course = CourseCode::canonical(&record.course_code);

            if !data.courses.contains_key(&course) {
                data.diagnostics
                    .push(Diagnostic::UnknownCourseInRequest { student, course });
                continue;
            }

            let tiers = data.requests.entry(student.clone()).or_default();
            match tiers.get(&course).copied() {
                None => {
                    tiers.insert(course, record.request_type);
                }
                Some(existing) => {
                    // At most one request per course; the higher tier wins.
                    let kept = existing.max(record.request_type);
                    tiers.insert(course.clone(), kept);
                    debug!("duplicate request for {course} by {student}, keeping {kept}");
                    data.diagnostics.push(Diagnostic::DuplicateRequest {
                        student,
                        course,
                        kept,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, blocks: &[&str]) -> CourseRecord {
        CourseRecord {
            course_code: code.to_string(),
            title: format!("{code} title"),
            length: 1,
            priority: None,
            available_blocks: blocks.iter().map(|b| b.to_string()).collect(),
            unavailable_blocks: vec![],
            minimum_section_size: 1,
            target_section_size: 5,
            maximum_section_size: 10,
            number_of_sections: 1,
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

    #[test]
    fn canonicalizes_codes_across_record_sets() {
        let data = Normalizer::normalize(
            &[course("MATH101", &["A"])],
            &[lecturer("Math101", 1, "p1")],
            &[request("s1", "math101", Priority::Required)],
        );
        assert!(data.diagnostics.is_empty());
        let code = CourseCode::canonical("math101");
        assert!(data.courses.contains_key(&code));
        assert_eq!(
            data.priority(&StudentId::new("s1"), &code),
            Some(Priority::Required)
        );
        assert!(data.sections.contains_key(&SectionId::new(code, 1)));
    }

    #[test]
    fn block_universe_is_deduplicated_union() {
        let data = Normalizer::normalize(
            &[course("a1", &["B", "A"]), course("b1", &["A", "C"])],
            &[],
            &[],
        );
        let blocks: Vec<_> = data.blocks.iter().map(|b| b.as_str()).collect();
        assert_eq!(blocks, vec!["A", "B", "C"]);
    }

    #[test]
    fn unknown_course_in_lecturer_record_is_dropped_and_reported() {
        let data = Normalizer::normalize(
            &[course("a1", &["A"])],
            &[lecturer("ghost", 1, "p1"), lecturer("a1", 1, "p1")],
            &[],
        );
        assert_eq!(data.sections.len(), 1);
        assert!(matches!(
            data.diagnostics[0],
            Diagnostic::UnknownCourseInLecturerRecord { .. }
        ));
    }

    #[test]
    fn unknown_course_in_request_is_dropped_and_reported() {
        let data = Normalizer::normalize(
            &[course("a1", &["A"])],
            &[lecturer("a1", 1, "p1")],
            &[request("s1", "ghost", Priority::Requested)],
        );
        assert!(data.requests.is_empty());
        assert!(matches!(
            data.diagnostics[0],
            Diagnostic::UnknownCourseInRequest { .. }
        ));
    }

    #[test]
    fn duplicate_request_keeps_higher_tier() {
        let data = Normalizer::normalize(
            &[course("a1", &["A"])],
            &[lecturer("a1", 1, "p1")],
            &[
                request("s1", "a1", Priority::Recommended),
                request("s1", "a1", Priority::Required),
            ],
        );
        assert_eq!(
            data.priority(&StudentId::new("s1"), &CourseCode::canonical("a1")),
            Some(Priority::Required)
        );
        assert!(matches!(
            data.diagnostics[0],
            Diagnostic::DuplicateRequest {
                kept: Priority::Required,
                ..
            }
        ));
    }

    #[test]
    fn overlapping_block_is_removed_from_available() {
        let mut record = course("a1", &["A", "B"]);
        record.unavailable_blocks = vec!["B".to_string()];
        let data = Normalizer::normalize(&[record], &[], &[]);
        let code = CourseCode::canonical("a1");
        let open = data.open_blocks(&code).unwrap();
        assert!(open.contains(&Block::new("A")));
        assert!(!open.contains(&Block::new("B")));
        assert!(matches!(
            data.diagnostics[0],
            Diagnostic::BlockListedAvailableAndUnavailable { .. }
        ));
    }

    #[test]
    fn missing_section_number_is_reported_not_defaulted() {
        let mut record = lecturer("a1", 1, "p1");
        record.section_number = None;
        let data = Normalizer::normalize(&[course("a1", &["A"])], &[record], &[]);
        assert!(data.sections.is_empty());
        assert!(matches!(
            data.diagnostics[0],
            Diagnostic::MissingSectionNumber { .. }
        ));
    }

    #[test]
    fn declared_sections_without_lecturer_rows_are_reported() {
        let data = Normalizer::normalize(&[course("a1", &["A"])], &[], &[]);
        assert!(data.sections.is_empty());
        assert!(matches!(
            data.diagnostics[0],
            Diagnostic::SectionCountMismatch {
                declared: 1,
                provided: 0,
                ..
            }
        ));
    }

    #[test]
    fn inconsistent_section_sizes_are_clamped_and_reported() {
        let mut record = course("a1", &["A"]);
        record.minimum_section_size = 8;
        record.target_section_size = 20;
        record.maximum_section_size = 5;
        let data = Normalizer::normalize(&[record], &[], &[]);
        let c = &data.courses[&CourseCode::canonical("a1")];
        assert_eq!(c.minimum_section_size, 5);
        assert_eq!(c.maximum_section_size, 5);
        assert_eq!(c.target_section_size, 5);
        assert!(matches!(
            data.diagnostics[0],
            Diagnostic::InvalidSectionSizes { .. }
        ));
    }
}
