// Raw boundary records as supplied by the upstream ingestion layer.
//
// Only the fields the core needs are modeled; the source format
// (spreadsheet, JSON) is the upstream collaborator's concern.

use crate::domain::Priority;
use serde::Deserialize;

fn one() -> u32 {
    1
}

/// One course row from the course list.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseRecord {
    pub course_code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub available_blocks: Vec<String>,
    #[serde(default)]
    pub unavailable_blocks: Vec<String>,
    #[serde(default)]
    pub minimum_section_size: u32,
    #[serde(default)]
    pub target_section_size: u32,
    #[serde(default)]
    pub maximum_section_size: u32,
    #[serde(default = "one")]
    pub number_of_sections: u32,
    #[serde(default)]
    pub total_credits: u32,
}

/// One lecturer assignment row: who is qualified to teach which section.
#[derive(Debug, Clone, Deserialize)]
pub struct LecturerRecord {
    pub course_code: String,
    /// Missing section numbers are a reported inconsistency, not a sentinel.
    #[serde(default)]
    pub section_number: Option<u32>,
    pub professor_id: String,
    #[serde(default)]
    pub start_term: Option<String>,
    #[serde(default)]
    pub term_name: Option<String>,
}

/// One student course request row.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestRecord {
    pub student_id: String,
    pub course_code: String,
    #[serde(rename = "type")]
    pub request_type: Priority,
}
