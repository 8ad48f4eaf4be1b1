//! Configuration management.
//!
//! Pipeline behavior switches and raw table format options. Recipes are not
//! configuration: they are built in code and passed to the pipeline directly.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Switches controlling a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Drop indicator columns that never carry a non-zero value
    pub prune_degenerate: bool,

    /// Fail when the input has columns the recipe neither transforms nor ignores
    pub reject_unmapped: bool,

    /// Run rules on blocking worker tasks instead of sequentially
    pub concurrent: bool,

    /// Maximum number of rules in flight when running concurrently
    pub workers: usize,

    /// Count values that fell back to null and log them per rule
    pub report_parse_warnings: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prune_degenerate: true,
            reject_unmapped: true,
            concurrent: false,
            workers: num_cpus::get(),
            report_parse_warnings: true,
        }
    }
}

impl PipelineConfig {
    /// Set the worker count for concurrent runs
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable concurrent rule execution
    pub fn with_concurrency(mut self) -> Self {
        self.concurrent = true;
        self
    }

    /// Keep every emitted column
    pub fn without_pruning(mut self) -> Self {
        self.prune_degenerate = false;
        self
    }

    /// Pass silently over input columns the recipe does not know
    pub fn allow_unmapped(mut self) -> Self {
        self.reject_unmapped = false;
        self
    }

    pub fn without_parse_warnings(mut self) -> Self {
        self.report_parse_warnings = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::configuration("workers must be at least 1"));
        }
        Ok(())
    }
}

/// Layout of a raw delimited table on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFormat {
    /// Field separator
    pub delimiter: u8,

    /// Field values read as missing, in addition to empty fields
    pub null_values: Vec<String>,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_values: Vec::new(),
        }
    }
}

impl TableFormat {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_null_values(mut self, values: &[&str]) -> Self {
        self.null_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Parse a one-character delimiter given on the command line; `\t` and
    /// `tab` mean a tab
    pub fn parse_delimiter(value: &str) -> Result<u8> {
        match value {
            "\\t" | "tab" => Ok(b'\t'),
            _ if value.len() == 1 && value.is_ascii() => Ok(value.as_bytes()[0]),
            _ => Err(PipelineError::configuration(format!(
                "Delimiter must be a single ASCII character, got '{value}'"
            ))),
        }
    }
}
