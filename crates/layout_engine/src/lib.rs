//! Layout Engine - banded report pagination
//!
//! Turns a report template and a data cursor into pages of absolutely
//! positioned controls. Sections are laid out against the height left on the
//! current page; growing content is pushed down, split at page breaks and
//! resumed on the next page.

mod backend;
mod config;
mod continuation;
mod engine;
mod error;
mod span;

pub use backend::*;
pub use config::*;
pub use continuation::*;
pub use engine::*;
pub use error::*;
pub use span::*;

use report_data::DataCursor;
use report_model::Report;

/// Paginate `report` and store the pages in [`Report::pages`].
///
/// Returns the number of pages produced.
pub fn paginate(
    report: &mut Report,
    cursor: impl DataCursor,
    backend: &dyn LayoutBackend,
    config: LayoutConfig,
) -> Result<usize> {
    let pages = ReportEngine::with_config(report, cursor, config)?.process(backend)?;
    let count = pages.len();
    report.pages = pages;
    Ok(count)
}
