//! Error types for report templates

use thiserror::Error;

use crate::SectionKind;

/// Template configuration errors, detected before any layout starts
#[derive(Debug, Error, PartialEq)]
pub enum ReportModelError {
    #[error("Invalid page height: {0}")]
    InvalidPageHeight(f64),

    #[error("Section '{name}' is stored as {expected} but declares kind {found}")]
    SectionKindMismatch {
        name: String,
        expected: SectionKind,
        found: SectionKind,
    },

    #[error("Section name must not be empty ({0})")]
    EmptySectionName(SectionKind),

    #[error("Duplicate section name: {0}")]
    DuplicateSectionName(String),

    #[error("Report has {groups} groups but {headers} group headers and {footers} group footers")]
    GroupSectionCountMismatch {
        groups: usize,
        headers: usize,
        footers: usize,
    },

    #[error("Group '{group}' references unknown field '{field}'")]
    UnknownGroupField { group: String, field: String },

    #[error("Section '{name}' is {height} high but only {available} fits between page header and footer")]
    SectionTooTall {
        name: String,
        height: f64,
        available: f64,
    },
}

pub type Result<T> = std::result::Result<T, ReportModelError>;
