//! Keyword-driven 0/1 flags.

use super::{OutputShape, Transform, TransformOutput, compile, indicator_column, non_blank, text_of};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    /// A match means 1
    True,
    /// A match means 0
    False,
}

/// Maps text to 1/0 by looking for configured keywords.
///
/// Either true-keywords or false-keywords are configured, never both. Empty
/// and null inputs stay null.
#[derive(Debug, Clone)]
pub struct BinaryTransformer {
    keywords: Vec<String>,
    matcher: Regex,
    polarity: Polarity,
    unmatched_is_null: bool,
}

impl BinaryTransformer {
    /// Flag rows containing any of `keywords` as 1, others as 0
    pub fn true_keywords(keywords: &[&str]) -> Result<Self> {
        Self::build(keywords, Polarity::True, true)
    }

    /// Flag rows containing any of `keywords` as 0, others as 1
    pub fn false_keywords(keywords: &[&str]) -> Result<Self> {
        Self::build(keywords, Polarity::False, true)
    }

    /// Build from either keyword list; both or neither is a configuration error
    pub fn new(true_keywords: &[&str], false_keywords: &[&str]) -> Result<Self> {
        match (true_keywords.is_empty(), false_keywords.is_empty()) {
            (false, true) => Self::true_keywords(true_keywords),
            (true, false) => Self::false_keywords(false_keywords),
            (false, false) => Err(PipelineError::configuration(
                "BinaryTransformer accepts true keywords or false keywords, not both",
            )),
            (true, true) => Err(PipelineError::configuration(
                "BinaryTransformer needs at least one keyword",
            )),
        }
    }

    /// Match keywords with exact case
    pub fn case_sensitive(self) -> Result<Self> {
        let keywords: Vec<&str> = self.keywords.iter().map(String::as_str).collect();
        let mut rebuilt = Self::build(&keywords, self.polarity, false)?;
        rebuilt.unmatched_is_null = self.unmatched_is_null;
        Ok(rebuilt)
    }

    /// Emit null instead of the default value when no keyword matches
    pub fn unmatched_as_null(mut self) -> Self {
        self.unmatched_is_null = true;
        self
    }

    fn build(keywords: &[&str], polarity: Polarity, case_insensitive: bool) -> Result<Self> {
        if keywords.is_empty() {
            return Err(PipelineError::configuration(
                "BinaryTransformer needs at least one keyword",
            ));
        }
        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            matcher: compile(&alternation, case_insensitive)?,
            polarity,
            unmatched_is_null: false,
        })
    }

    fn flag(&self, text: &str) -> Option<i32> {
        let matched = self.matcher.is_match(text);
        match (matched, self.polarity) {
            (true, Polarity::True) => Some(1),
            (true, Polarity::False) => Some(0),
            (false, _) if self.unmatched_is_null => None,
            (false, Polarity::True) => Some(0),
            (false, Polarity::False) => Some(1),
        }
    }
}

impl Transform for BinaryTransformer {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        let values: Vec<Option<i32>> = text
            .into_iter()
            .map(|value| non_blank(value).and_then(|v| self.flag(v)))
            .collect();

        Ok(TransformOutput::Single(indicator_column(
            column.name().as_str(),
            values,
        )))
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Fixed(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(transformer: &BinaryTransformer, values: &[Option<&str>]) -> Vec<Option<i32>> {
        let column = Column::new("raw".into(), values);
        let output = transformer.apply(&column).unwrap();
        let columns = output.into_columns();
        columns[0].i32().unwrap().into_iter().collect()
    }

    #[test]
    fn test_true_keywords() {
        let transformer = BinaryTransformer::true_keywords(&["Poly"]).unwrap();
        let result = flags(
            &transformer,
            &[
                Some("Polycrystalline"),
                Some("single crystal"),
                Some("polycrystal"),
                None,
                Some("  "),
            ],
        );
        assert_eq!(result, vec![Some(1), Some(0), Some(1), None, None]);
    }

    #[test]
    fn test_false_keywords() {
        let transformer = BinaryTransformer::false_keywords(&["none", "undoped"]).unwrap();
        let result = flags(&transformer, &[Some("None"), Some("Al doped"), Some("UNDOPED")]);
        assert_eq!(result, vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_case_sensitive_matching() {
        let transformer = BinaryTransformer::true_keywords(&["LiPF"])
            .unwrap()
            .case_sensitive()
            .unwrap();
        let result = flags(&transformer, &[Some("1M LiPF6 in EC"), Some("lipf6")]);
        assert_eq!(result, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_unmatched_as_null() {
        let transformer = BinaryTransformer::true_keywords(&["Poly"])
            .unwrap()
            .unmatched_as_null();
        let result = flags(&transformer, &[Some("poly"), Some("single")]);
        assert_eq!(result, vec![Some(1), None]);
    }

    #[test]
    fn test_keywords_are_literal() {
        let transformer = BinaryTransformer::true_keywords(&["C2/c", "a.b"]).unwrap();
        let result = flags(&transformer, &[Some("C2/c"), Some("axb")]);
        assert_eq!(result, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_exclusive_configuration() {
        assert!(matches!(
            BinaryTransformer::new(&["a"], &["b"]),
            Err(PipelineError::Configuration { .. })
        ));
        assert!(matches!(
            BinaryTransformer::new(&[], &[]),
            Err(PipelineError::Configuration { .. })
        ));
        assert!(BinaryTransformer::new(&["a"], &[]).is_ok());
    }
}
