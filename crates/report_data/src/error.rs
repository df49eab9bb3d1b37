//! Error types for report data sources

use thiserror::Error;

/// Errors that can occur while loading a data source
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error reading a data file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing JSON data
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid data source shape
    #[error("Invalid data source: {0}")]
    InvalidDataSource(String),

    /// Invalid path expression for JSON traversal
    #[error("Invalid path expression: {0}")]
    InvalidPath(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Result type for data source operations
pub type Result<T> = std::result::Result<T, DataError>;
