//! Report Model - Template description of a banded report
//!
//! A [`Report`] is a set of typed [`Section`]s (report header, page header,
//! page footer, group header/footer pairs, details, report footer), each
//! holding positioned [`Control`]s. Templates are built once and never
//! mutated during pagination; the engine clones them into runtime instances
//! that keep a [`ControlId`] back-reference to their template.

mod control;
mod control_id;
mod error;
mod geometry;
mod page;
mod report;
mod section;

pub use control::*;
pub use control_id::*;
pub use error::*;
pub use geometry::*;
pub use page::*;
pub use report::*;
pub use section::*;
