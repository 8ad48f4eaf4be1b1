//! Error handling for recipe construction and pipeline execution.
//!
//! Structural problems (schema, arity, duplicate or unmapped columns) are
//! fatal and abort the whole run. Values a transformer cannot parse never
//! surface here; they become nulls and are counted in the run report.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Input table is missing columns required by the recipe: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error(
        "Rule for input column '{input_column}' produced {found} output columns, expected {expected}"
    )]
    ArityMismatch {
        input_column: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "Rule for input column '{input_column}' produced {found} rows, expected {expected}"
    )]
    RowCountMismatch {
        input_column: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "Output column '{name}' declared by rule '{second_rule}' is already produced by rule '{first_rule}'"
    )]
    DuplicateOutput {
        name: String,
        first_rule: String,
        second_rule: String,
    },

    #[error("Input columns have no rule and are not ignored by the recipe: {}", columns.join(", "))]
    UnmappedColumns { columns: Vec<String> },

    #[error("Rule task failed: {reason}")]
    TaskFailed { reason: String },
}

impl PipelineError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for errors caused by a mismatch between recipe and data rather than I/O
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Schema { .. }
                | Self::ArityMismatch { .. }
                | Self::RowCountMismatch { .. }
                | Self::DuplicateOutput { .. }
                | Self::UnmappedColumns { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
