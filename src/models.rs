//! Core data structures and types for feature extraction.
//!
//! Defines numeric kinds, unit handling, normalization policies and the
//! statistics reported after a pipeline run.

use crate::constants::{percentage, round_to, units};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Numeric kind of an extracted value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NumberKind {
    Int,
    #[default]
    Float,
}

/// Temperature units understood by the temperature extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Celsius,
    Kelvin,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Detect the unit from the marker that follows a number.
    ///
    /// Unmarked numbers are laboratory Celsius readings.
    pub fn from_marker(marker: Option<&str>) -> Self {
        let Some(marker) = marker else {
            return TemperatureUnit::Celsius;
        };
        let compact: String = marker.chars().filter(|c| !c.is_whitespace()).collect();

        match compact.as_str() {
            "K" => TemperatureUnit::Kelvin,
            "°F" | "℉" | "F" => TemperatureUnit::Fahrenheit,
            _ => TemperatureUnit::Celsius,
        }
    }

    /// Convert a value expressed in this unit into `target`
    pub fn convert(self, value: f64, target: TemperatureUnit) -> f64 {
        let celsius = match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Kelvin => value - units::KELVIN_OFFSET,
            TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        };

        match target {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Kelvin => celsius + units::KELVIN_OFFSET,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Short symbol used in column names and reports
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Kelvin => "K",
            TemperatureUnit::Fahrenheit => "F",
        }
    }
}

/// Post-extraction normalization applied to every captured value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Normalization {
    #[default]
    None,
    /// Three-branch percentage policy, see [`normalize_percentage`]
    Percentage,
}

impl Normalization {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Normalization::None => value,
            Normalization::Percentage => normalize_percentage(value),
        }
    }
}

/// Normalize a raw percentage capture.
///
/// Overscaled values in (100, 10000) are divided by 100, fractions at or
/// below 1.0 are multiplied by 100, anything else is kept. The result is
/// rounded to 2 decimals. The overscale branch is checked first.
pub fn normalize_percentage(value: f64) -> f64 {
    let scaled = if value > percentage::OVERSCALE_FLOOR && value < percentage::OVERSCALE_CEILING {
        value / percentage::SCALE
    } else if value <= percentage::FRACTION_CEILING {
        value * percentage::SCALE
    } else {
        value
    };
    round_to(scaled, 2)
}

/// Values a rule could not parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// Input column of the rule
    pub rule: String,
    /// Rows with a non-empty input whose outputs are all null
    pub unparsed: usize,
}

/// Statistics of a single pipeline run
#[derive(Debug, Default, Clone)]
pub struct TransformReport {
    pub rows: usize,
    pub rules_executed: usize,
    pub special_rules_executed: usize,
    pub columns_emitted: usize,
    pub pruned_columns: Vec<String>,
    pub parse_warnings: Vec<ParseWarning>,
    pub elapsed: Duration,
}

impl TransformReport {
    /// Columns left in the output table after pruning
    pub fn columns_kept(&self) -> usize {
        self.columns_emitted - self.pruned_columns.len()
    }

    /// Total number of values that fell back to null
    pub fn total_unparsed(&self) -> usize {
        self.parse_warnings.iter().map(|w| w.unparsed).sum()
    }
}
