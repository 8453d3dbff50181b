//! Error types for country conversion.
//!
//! Errors are split by who has to act on them: configuration errors
//! point at a broken table or a misconfigured caller, lookup errors are
//! per-value misses (only raised in strict mode), and table errors come
//! from loading reference data.

use std::path::PathBuf;

use thiserror::Error;

/// Errors caused by the reference table or by caller configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Classification '{name}' not recognized")]
    UnknownClassification {
        name: String,
    },

    #[error("Invalid regex for '{name}' (row {row}): {reason}")]
    InvalidPattern {
        row: usize,
        name: String,
        reason: String,
    },

    #[error("Record '{name}' has no regex pattern")]
    MissingPattern {
        name: String,
    },

    #[error("Field {field} of '{name}' is matched by {matched:?} instead of its own pattern")]
    InconsistentPattern {
        name: String,
        field: String,
        matched: Vec<String>,
    },
}

/// Per-value lookup failures, surfaced when strict conversion is requested.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("'{value}' not found in {scheme}")]
    NotFound {
        value: String,
        scheme: String,
    },

    #[error("'{value}' matches several records: {candidates:?}")]
    Ambiguous {
        value: String,
        candidates: Vec<String>,
    },
}

/// Errors raised while reading or assembling a reference table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{column}' is missing")]
    MissingColumn {
        column: String,
    },

    #[error("Column '{column}' appears more than once")]
    DuplicateColumn {
        column: String,
    },

    #[error("Value '{value}' in integer column '{column}' is not an integer")]
    InvalidInteger {
        column: String,
        value: String,
    },

    #[error("Row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

impl ConvertError {
    /// Shorthand for an unknown classification name.
    #[must_use]
    pub fn unknown_classification(name: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::UnknownClassification { name: name.into() })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if this is a lookup error.
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }

    /// Returns true if this is a table loading error.
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Self::Table(_))
    }

    /// Returns true if a classification name was not recognized.
    #[must_use]
    pub const fn is_unknown_classification(&self) -> bool {
        matches!(
            self,
            Self::Configuration(ConfigurationError::UnknownClassification { .. })
        )
    }
}

/// Result type alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
