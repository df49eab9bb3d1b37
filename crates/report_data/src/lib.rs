//! Report Data Sources
//!
//! Row-oriented data consumed by the pagination engine. The engine only sees
//! the [`DataCursor`] trait: it advances once per detail row, reads bound
//! field values from the current row and asks for a sort by group fields.
//!
//! # Example
//!
//! ```rust
//! use report_data::{DataCursor, JsonLoader};
//!
//! let json = r#"[{"name": "Alice"}, {"name": "Bob"}]"#;
//! let mut source = JsonLoader::new().load_str(json, "people").unwrap();
//!
//! assert!(source.advance());
//! assert_eq!(source.value_or_default("name"), "Alice");
//! assert!(source.advance());
//! assert!(source.is_last());
//! assert!(!source.advance());
//! ```

mod cursor;
mod data_source;
mod error;
mod json_source;

pub use cursor::{DataCursor, EmptyDataSource};
pub use data_source::{ColumnDef, DataSource, DataType, Record, Value};
pub use error::{DataError, Result};
pub use json_source::{get_nested_value, JsonConfig, JsonLoader};
