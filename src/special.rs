//! Rules that read more than one raw column at once.
//!
//! These cannot be expressed as a single-column [`Transform`](crate::transformers::Transform)
//! and run as a post-pass against the original input table. Their outputs
//! join the same degenerate-column pruning as regular indicator outputs.

use crate::constants::{DEFAULT_NUMBER_PATTERN, LABEL_SEPARATOR};
use crate::error::{PipelineError, Result};
use crate::transformers::formula::{default_vocabulary, fraction_columns, parse_formula, to_fractions};
use crate::transformers::number::numbers_in;
use crate::transformers::{compile, non_blank, text_of};
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// A transformation with joint access to several input columns
pub trait JointTransform: fmt::Debug + Send + Sync {
    /// Identity used in logs and error messages
    fn name(&self) -> String;

    /// Raw columns read by this rule
    fn input_columns(&self) -> Vec<String>;

    /// Output column names, in emission order
    fn output_columns(&self) -> Vec<String>;

    /// Produce columns named and ordered as [`output_columns`](Self::output_columns)
    fn apply(&self, table: &DataFrame) -> Result<Vec<Column>>;

    fn is_indicator(&self) -> bool {
        true
    }
}

/// Joins an element list with a separate ratio string.
///
/// The composition column holds either an element list ("Ni, Co, Mn",
/// "Ni-Co-Mn") or an inline formula ("Ni0.8Co0.1Mn0.1"); the ratio column
/// holds one number per element ("8:1:1", "0.8/0.1/0.1", "80 10 10"). Weights
/// are rescaled into fractions summing to 1. A bare element list without
/// ratios splits evenly; a count mismatch leaves the row null.
#[derive(Debug, Clone)]
pub struct CompositionRatioHandler {
    composition_column: String,
    ratio_column: String,
    prefix: String,
    vocabulary: Vec<String>,
    list_separator: Regex,
    number: Regex,
}

impl CompositionRatioHandler {
    pub fn new(composition_column: &str, ratio_column: &str, prefix: &str) -> Result<Self> {
        if composition_column == ratio_column {
            return Err(PipelineError::configuration(format!(
                "Composition and ratio must be different columns, got '{composition_column}' twice"
            )));
        }
        Ok(Self {
            composition_column: composition_column.to_string(),
            ratio_column: ratio_column.to_string(),
            prefix: prefix.to_string(),
            vocabulary: default_vocabulary(),
            list_separator: compile(r"[\s,;:/\-]+", false)?,
            number: compile(DEFAULT_NUMBER_PATTERN, false)?,
        })
    }

    /// Restrict output columns to the given element symbols
    pub fn with_vocabulary(mut self, symbols: &[&str]) -> Self {
        self.vocabulary = symbols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Tokens stay unmerged so each one pairs with its own ratio weight
    fn element_list(&self, composition: &str) -> Option<Vec<(String, f64)>> {
        let tokens: Vec<&str> = self
            .list_separator
            .split(composition)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() || !tokens.iter().all(|t| self.vocabulary.iter().any(|v| v == t)) {
            return None;
        }
        Some(tokens.into_iter().map(|t| (t.to_string(), 1.0)).collect())
    }

    fn row(&self, composition: Option<&str>, ratio: Option<&str>) -> Option<HashMap<String, f64>> {
        let composition = non_blank(composition)?;
        let mut amounts = self
            .element_list(composition)
            .or_else(|| parse_formula(composition, &self.vocabulary))?;

        if let Some(ratio) = non_blank(ratio) {
            let weights = numbers_in(&self.number, ratio);
            if weights.len() != amounts.len() {
                return None;
            }
            for ((_, amount), weight) in amounts.iter_mut().zip(weights) {
                *amount = weight;
            }
        }
        to_fractions(&amounts)
    }
}

impl JointTransform for CompositionRatioHandler {
    fn name(&self) -> String {
        format!("{}+{}", self.composition_column, self.ratio_column)
    }

    fn input_columns(&self) -> Vec<String> {
        vec![self.composition_column.clone(), self.ratio_column.clone()]
    }

    fn output_columns(&self) -> Vec<String> {
        self.vocabulary
            .iter()
            .map(|symbol| format!("{}{}{}", self.prefix, LABEL_SEPARATOR, symbol))
            .collect()
    }

    fn apply(&self, table: &DataFrame) -> Result<Vec<Column>> {
        let composition = text_of(table.column(&self.composition_column)?)?;
        let ratio = text_of(table.column(&self.ratio_column)?)?;

        let rows: Vec<Option<HashMap<String, f64>>> = composition
            .into_iter()
            .zip(ratio.into_iter())
            .map(|(c, r)| self.row(c, r))
            .collect();

        Ok(fraction_columns(&self.vocabulary, &rows)
            .into_iter()
            .zip(self.output_columns())
            .map(|(column, name)| column.with_name(name.into()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> CompositionRatioHandler {
        CompositionRatioHandler::new("composition", "ratio", "Fraction")
            .unwrap()
            .with_vocabulary(&["Ni", "Co", "Mn", "Al"])
    }

    fn column_values(columns: &[Column], name: &str) -> Vec<Option<f64>> {
        columns
            .iter()
            .find(|c| c.name().as_str() == name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_ratio_scales_agree() {
        let table = df!(
            "composition" => &["Ni, Co, Mn", "Ni-Co-Mn", "Ni Co Mn"],
            "ratio" => &["8:1:1", "0.8/0.1/0.1", "80 10 10"]
        )
        .unwrap();
        let columns = handler().apply(&table).unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(
            column_values(&columns, "Fraction_Ni"),
            vec![Some(0.8), Some(0.8), Some(0.8)]
        );
        assert_eq!(
            column_values(&columns, "Fraction_Al"),
            vec![Some(0.0), Some(0.0), Some(0.0)]
        );
    }

    #[test]
    fn test_missing_ratio_splits_evenly_and_mismatch_is_null() {
        let table = df!(
            "composition" => &[Some("Ni, Mn"), Some("Ni, Co, Mn"), None],
            "ratio" => &[None, Some("1:1"), Some("1:1")]
        )
        .unwrap();
        let columns = handler().apply(&table).unwrap();
        assert_eq!(
            column_values(&columns, "Fraction_Ni"),
            vec![Some(0.5), None, None]
        );
    }

    #[test]
    fn test_repeated_element_weights_are_added() {
        let table = df!(
            "composition" => &["Ni, Ni, Co"],
            "ratio" => &["1:1:2"]
        )
        .unwrap();
        let columns = handler().apply(&table).unwrap();
        assert_eq!(column_values(&columns, "Fraction_Ni"), vec![Some(0.5)]);
        assert_eq!(column_values(&columns, "Fraction_Co"), vec![Some(0.5)]);
    }

    #[test]
    fn test_inline_formula_without_ratio() {
        let table = df!(
            "composition" => &["Ni0.6Co0.2Mn0.2"],
            "ratio" => &[None::<&str>]
        )
        .unwrap();
        let columns = handler().apply(&table).unwrap();
        assert_eq!(column_values(&columns, "Fraction_Co"), vec![Some(0.2)]);
    }

    #[test]
    fn test_declared_io() {
        let handler = handler();
        assert_eq!(handler.input_columns(), vec!["composition", "ratio"]);
        assert_eq!(handler.output_columns()[0], "Fraction_Ni");
        assert_eq!(handler.name(), "composition+ratio");
        assert!(CompositionRatioHandler::new("a", "a", "x").is_err());
    }
}
