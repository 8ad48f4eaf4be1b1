//! Unit-aware temperature extraction.

use super::number::{NumericPolicy, numbers_in, slot_columns};
use super::{OutputShape, Transform, TransformOutput, compile, non_blank, text_of};
use crate::constants::units::{DURATION_MARKER_PATTERN, RATE_MARKER_PATTERN, TEMPERATURE_PATTERN};
use crate::error::{PipelineError, Result};
use crate::models::TemperatureUnit;
use polars::prelude::*;
use regex::Regex;
use tracing::trace;

/// Extracts up to `width` temperatures per value and converts them to one unit.
///
/// Numbers adjacent to a duration marker ("4h", "30 min", "2 小时") are
/// collected separately and every temperature candidate with the same value
/// is discarded, so that "750°C for 4h" yields only 750. Heating rates
/// ("5 °C/min") are discarded the same way. A temperature repeated within
/// one value is kept once.
#[derive(Debug, Clone)]
pub struct MultiTemperatureExtractor {
    width: usize,
    target: TemperatureUnit,
    temperature: Regex,
    duration: Regex,
    rate: Regex,
    policy: NumericPolicy,
}

impl MultiTemperatureExtractor {
    /// Extract temperatures converted to Kelvin
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(PipelineError::configuration(
                "MultiTemperatureExtractor needs at least one output",
            ));
        }
        Ok(Self {
            width,
            target: TemperatureUnit::Kelvin,
            temperature: compile(TEMPERATURE_PATTERN, false)?,
            duration: compile(DURATION_MARKER_PATTERN, false)?,
            rate: compile(RATE_MARKER_PATTERN, false)?,
            policy: NumericPolicy::default(),
        })
    }

    pub fn convert_to(mut self, target: TemperatureUnit) -> Self {
        self.target = target;
        self
    }

    /// Replace the competing-unit pattern; capture 1 must be the number
    pub fn with_exclusion_pattern(mut self, pattern: &str) -> Result<Self> {
        self.duration = compile(pattern, false)?;
        Ok(self)
    }

    pub fn target(&self) -> TemperatureUnit {
        self.target
    }

    fn extract(&self, text: &str) -> Vec<f64> {
        let mut excluded = numbers_in(&self.duration, text);
        excluded.extend(numbers_in(&self.rate, text));

        let mut temperatures: Vec<f64> = Vec::with_capacity(self.width);
        let candidates = self
            .temperature
            .captures_iter(text)
            .filter_map(|caps| {
                let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
                let marker = caps.get(2).map(|m| m.as_str());
                Some((value, TemperatureUnit::from_marker(marker)))
            })
            .filter(|(value, _)| !excluded.contains(value))
            .map(|(value, unit)| unit.convert(value, self.target));
        for kelvin in candidates {
            if temperatures.len() == self.width {
                break;
            }
            if !temperatures.contains(&kelvin) {
                temperatures.push(kelvin);
            }
        }

        trace!(
            "Temperatures in '{}': {:?} (excluded {:?})",
            text, temperatures, excluded
        );
        temperatures
    }
}

impl Transform for MultiTemperatureExtractor {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        let rows: Vec<Vec<f64>> = text
            .into_iter()
            .map(|value| non_blank(value).map(|v| self.extract(v)).unwrap_or_default())
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
