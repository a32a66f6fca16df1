//! Error types for field_nav

use thiserror::Error;

/// Main error type for the mapping and navigation stack
#[derive(Debug, Error)]
pub enum NavError {
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
    /// Persisted grid is malformed
    #[error("Grid parse error at line {line}: {message}")]
    GridParseError { line: usize, message: String },
    /// Grid dimensions do not match the store
    #[error("Shape mismatch: expected {expected_rows}x{expected_cols}, found {rows}x{cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    /// A worker thread could not be started or stopped cleanly
    #[error("Task error: {0}")]
    TaskError(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    VisualizationError(String),
}

/// Result type alias for navigation operations
pub type NavResult<T> = Result<T, NavError>;
