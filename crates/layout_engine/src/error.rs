//! Error types for the layout engine

use thiserror::Error;

/// Failure reported by a measurement/splitting backend
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    #[error("Measurement failed: {0}")]
    Measure(String),

    #[error("Cannot split control: {0}")]
    Split(String),
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid report template: {0}")]
    Template(#[from] report_model::ReportModelError),

    #[error("Report has no {0} section")]
    MissingSection(report_model::SectionKind),

    #[error("Sub-report template {0} not found")]
    MissingSubReport(report_model::ControlId),

    #[error("Backend failed on control {control_index} of section '{section}': {source}")]
    Backend {
        section: String,
        control_index: usize,
        #[source]
        source: BackendError,
    },

    #[error(
        "Section '{section}' does not fit on an empty page{}",
        .control_index.map(|i| format!(" (control {})", i)).unwrap_or_default()
    )]
    Unplaceable {
        section: String,
        control_index: Option<usize>,
    },

    #[error("Page band '{section}' is taller than a fresh page")]
    PageBandOverflow { section: String },

    #[error("Page limit of {0} exceeded")]
    PageLimitExceeded(usize),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
