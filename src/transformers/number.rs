//! Numeric extraction from free text.

use super::{OutputShape, Transform, TransformOutput, capture_text, compile, non_blank, text_of};
use crate::constants::{DEFAULT_NUMBER_PATTERN, DEFAULT_ROUND_DIGITS, round_to};
use crate::error::{PipelineError, Result};
use crate::models::{Normalization, NumberKind};
use polars::prelude::*;
use regex::Regex;

/// Casting, rounding and normalization shared by the number extractors
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NumericPolicy {
    pub kind: NumberKind,
    pub round_digits: Option<u32>,
    pub normalization: Normalization,
}

impl Default for NumericPolicy {
    fn default() -> Self {
        Self {
            kind: NumberKind::Float,
            round_digits: Some(DEFAULT_ROUND_DIGITS),
            normalization: Normalization::None,
        }
    }
}

impl NumericPolicy {
    fn finish(&self, value: f64) -> f64 {
        let value = self.normalization.apply(value);
        match (self.kind, self.round_digits) {
            (NumberKind::Int, _) => value.trunc(),
            (NumberKind::Float, Some(digits)) => round_to(value, digits),
            (NumberKind::Float, None) => value,
        }
    }

    /// Build the typed output column
    pub(crate) fn column(&self, name: &str, values: Vec<Option<f64>>) -> Column {
        match self.kind {
            NumberKind::Int => {
                let ints: Vec<Option<i64>> = values
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()).map(|x| self.finish(x) as i64))
                    .collect();
                Column::new(name.into(), ints)
            }
            NumberKind::Float => {
                let floats: Vec<Option<f64>> = values
                    .into_iter()
                    .map(|v| v.map(|x| self.finish(x)))
                    .collect();
                Column::new(name.into(), floats)
            }
        }
    }
}

/// All parseable numbers matched by `pattern`, in order of appearance
pub(crate) fn numbers_in(pattern: &Regex, text: &str) -> Vec<f64> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| capture_text(&caps))
        .filter_map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Extracts the first number from each value.
///
/// Patterns are tried in priority order, so a unit-qualified pattern can take
/// precedence over a bare-number fallback. No match yields null.
#[derive(Debug, Clone)]
pub struct NumberExtractor {
    patterns: Vec<Regex>,
    policy: NumericPolicy,
}

impl NumberExtractor {
    /// First decimal number, as a float rounded to 2 places
    pub fn new() -> Result<Self> {
        Self::with_patterns(&[DEFAULT_NUMBER_PATTERN])
    }

    /// Candidate patterns in priority order; capture group 1 is the value if present
    pub fn with_patterns(patterns: &[&str]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(PipelineError::configuration(
                "NumberExtractor needs at least one pattern",
            ));
        }
        let patterns = patterns
            .iter()
            .map(|p| compile(p, true))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            policy: NumericPolicy::default(),
        })
    }

    /// Percentage-bearing values, normalized with the three-branch policy
    pub fn percentage() -> Result<Self> {
        Ok(Self::new()?.normalized(Normalization::Percentage))
    }

    pub fn kind(mut self, kind: NumberKind) -> Self {
        self.policy.kind = kind;
        self
    }

    pub fn round_digits(mut self, digits: Option<u32>) -> Self {
        self.policy.round_digits = digits;
        self
    }

    pub fn normalized(mut self, normalization: Normalization) -> Self {
        self.policy.normalization = normalization;
        self
    }

    fn extract(&self, text: &str) -> Option<f64> {
        self.patterns
            .iter()
            .find_map(|pattern| numbers_in(pattern, text).into_iter().next())
    }
}

impl Transform for NumberExtractor {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        let values: Vec<Option<f64>> = text
            .into_iter()
            .map(|value| non_blank(value).and_then(|v| self.extract(v)))
            .collect();

        Ok(TransformOutput::Single(
            self.policy.column(column.name().as_str(), values),
        ))
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Fixed(1)
    }
}

/// Extracts up to `width` numbers per value, in order of appearance.
///
/// Extra numbers are dropped; missing slots are right-padded with null.
#[derive(Debug, Clone)]
pub struct MultiNumberExtractor {
    width: usize,
    pattern: Regex,
    policy: NumericPolicy,
}

impl MultiNumberExtractor {
    pub fn new(width: usize) -> Result<Self> {
        Self::with_pattern(width, DEFAULT_NUMBER_PATTERN)
    }

    pub fn with_pattern(width: usize, pattern: &str) -> Result<Self> {
        if width == 0 {
            return Err(PipelineError::configuration(
                "MultiNumberExtractor needs at least one output",
            ));
        }
        Ok(Self {
            width,
            pattern: compile(pattern, true)?,
            policy: NumericPolicy::default(),
        })
    }

    pub fn kind(mut self, kind: NumberKind) -> Self {
        self.policy.kind = kind;
        self
    }

    pub fn round_digits(mut self, digits: Option<u32>) -> Self {
        self.policy.round_digits = digits;
        self
    }

    pub fn normalized(mut self, normalization: Normalization) -> Self {
        self.policy.normalization = normalization;
        self
    }
}

/// Spread per-row value lists into `width` slot columns
pub(crate) fn slot_columns(
    policy: &NumericPolicy,
    base: &str,
    width: usize,
    rows: Vec<Vec<f64>>,
) -> Vec<Column> {
    (0..width)
        .map(|slot| {
            let values: Vec<Option<f64>> =
                rows.iter().map(|row| row.get(slot).copied()).collect();
            policy.column(&format!("{}_{}", base, slot + 1), values)
        })
        .collect()
}

impl Transform for MultiNumberExtractor {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        let rows: Vec<Vec<f64>> = text
            .into_iter()
            .map(|value| {
                non_blank(value)
                    .map(|v| {
                        let mut found = numbers_in(&self.pattern, v);
                        found.truncate(self.width);
                        found
                    })
                    .unwrap_or_default()
            })
            .collect();

        Ok(TransformOutput::Many(slot_columns(
            &self.policy,
            column.name().as_str(),
            self.width,
            rows,
        )))
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Fixed(self.width)
    }
}
