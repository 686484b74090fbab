//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for enrichment runs
#[derive(Error, Debug)]
pub enum EnrichError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Parse errors (malformed BED/GCT lines)
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Invalid data errors (inconsistent dimensions, empty inputs)
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// A geneset size required by the user's SNPs has no background genesets to draw from
    #[error(
        "No background SNPs overlap exactly {size} gene(s); cannot draw size-matched null SNP sets"
    )]
    EmptyBin { size: usize },

    /// Conditions requested by the user that are absent from the expression matrix
    #[error("Conditions not found in expression file: {}", names.join(", "))]
    MissingConditions { names: Vec<String> },

    /// Expression matrix is not in a mode the scorer supports
    #[error("Unsupported expression matrix: {message}")]
    UnsupportedExpression { message: String },

    /// Configuration errors (invalid CLI arguments, thread pool setup)
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Type alias for Results using EnrichError
pub type Result<T> = std::result::Result<T, EnrichError>;

impl EnrichError {
    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn unsupported_expression(message: impl Into<String>) -> Self {
        Self::UnsupportedExpression {
            message: message.into(),
        }
    }
}
