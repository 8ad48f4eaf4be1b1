//! One-hot and multi-label indicator encoders.
//!
//! All encoders here emit 0/1 `Int32` columns and are indicator-style, so the
//! engine may prune outputs that never fire across the whole table. Null or
//! blank inputs produce 0 in every output.

use super::{
    OutputShape, Transform, TransformOutput, compile, indicator_column, non_blank, text_of,
};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use regex::Regex;
use std::collections::BTreeSet;

/// A labeled keyword matcher
#[derive(Debug, Clone)]
struct Keyword {
    label: String,
    matcher: Regex,
}

fn encode(matchers: &[Keyword], text: &StringChunked) -> Vec<Column> {
    matchers
        .iter()
        .map(|keyword| {
            let values: Vec<Option<i32>> = text
                .into_iter()
                .map(|value| {
                    let hit = non_blank(value).is_some_and(|v| keyword.matcher.is_match(v));
                    Some(i32::from(hit))
                })
                .collect();
            indicator_column(&keyword.label, values)
        })
        .collect()
}

fn ensure_unique_labels<'a>(labels: impl Iterator<Item = &'a str>, what: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for label in labels {
        if !seen.insert(label) {
            return Err(PipelineError::configuration(format!(
                "{what} declares label '{label}' more than once"
            )));
        }
    }
    if seen.is_empty() {
        return Err(PipelineError::configuration(format!(
            "{what} needs at least one keyword"
        )));
    }
    Ok(())
}

/// One indicator per keyword: 1 iff the keyword occurs in the text
#[derive(Debug, Clone)]
pub struct MultiBinaryDummifier {
    keywords: Vec<Keyword>,
}

impl MultiBinaryDummifier {
    /// Literal substring keywords, labeled by themselves
    pub fn literal(keywords: &[&str], case_insensitive: bool) -> Result<Self> {
        let pairs: Vec<(&str, String)> = keywords
            .iter()
            .map(|k| (*k, regex::escape(k)))
            .collect();
        Self::build(&pairs, case_insensitive)
    }

    /// Whole-word keywords (`\bword\b`), labeled by the word.
    ///
    /// Avoids "Co" firing on "Coating" or "EC" on "DEC".
    pub fn word_bounded(words: &[&str], case_insensitive: bool) -> Result<Self> {
        let pairs: Vec<(&str, String)> = words
            .iter()
            .map(|w| (*w, format!(r"\b{}\b", regex::escape(w))))
            .collect();
        Self::build(&pairs, case_insensitive)
    }

    /// Explicit `(label, pattern)` pairs
    pub fn patterns(pairs: &[(&str, &str)], case_insensitive: bool) -> Result<Self> {
        let pairs: Vec<(&str, String)> = pairs
            .iter()
            .map(|(label, pattern)| (*label, pattern.to_string()))
            .collect();
        Self::build(&pairs, case_insensitive)
    }

    fn build(pairs: &[(&str, String)], case_insensitive: bool) -> Result<Self> {
        ensure_unique_labels(pairs.iter().map(|(l, _)| *l), "MultiBinaryDummifier")?;
        let keywords = pairs
            .iter()
            .map(|(label, pattern)| {
                Ok(Keyword {
                    label: label.to_string(),
                    matcher: compile(pattern, case_insensitive)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keywords })
    }

    pub fn labels(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.label.clone()).collect()
    }
}

impl Transform for MultiBinaryDummifier {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        Ok(TransformOutput::Many(encode(&self.keywords, &text)))
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Labeled(self.labels())
    }

    fn is_indicator(&self) -> bool {
        true
    }
}

/// One indicator per named group of alias keywords.
///
/// Groups are independent: a value mentioning aliases of two groups sets both.
#[derive(Debug, Clone)]
pub struct KeywordDummifier {
    groups: Vec<Keyword>,
}

impl KeywordDummifier {
    pub fn new(groups: &[(&str, &[&str])], case_insensitive: bool) -> Result<Self> {
        ensure_unique_labels(groups.iter().map(|(name, _)| *name), "KeywordDummifier")?;
        let groups = groups
            .iter()
            .map(|(name, aliases)| {
                if aliases.is_empty() {
                    return Err(PipelineError::configuration(format!(
                        "KeywordDummifier group '{name}' has no aliases"
                    )));
                }
                let alternation = aliases
                    .iter()
                    .map(|a| regex::escape(a))
                    .collect::<Vec<_>>()
                    .join("|");
                Ok(Keyword {
                    label: name.to_string(),
                    matcher: compile(&alternation, case_insensitive)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { groups })
    }
}

impl Transform for KeywordDummifier {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        Ok(TransformOutput::Many(encode(&self.groups, &text)))
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Labeled(self.groups.iter().map(|g| g.label.clone()).collect())
    }

    fn is_indicator(&self) -> bool {
        true
    }
}

/// One-hot encoding over categories.
///
/// With a fixed vocabulary the width is known when the recipe is built and
/// unknown values encode as all zeros. Without one, categories are the
/// sorted distinct trimmed values of the column being transformed.
#[derive(Debug, Clone, Default)]
pub struct AutoDummifier {
    categories: Option<Vec<String>>,
}

impl AutoDummifier {
    /// Categories discovered from the data at execution time
    pub fn new() -> Self {
        Self { categories: None }
    }

    /// Categories fixed up front
    pub fn with_categories(categories: &[&str]) -> Result<Self> {
        let categories: Vec<String> = categories.iter().map(|c| c.trim().to_string()).collect();
        ensure_unique_labels(categories.iter().map(String::as_str), "AutoDummifier")?;
        Ok(Self {
            categories: Some(categories),
        })
    }

    fn observed(text: &StringChunked) -> Vec<String> {
        text.into_iter()
            .filter_map(non_blank)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn one_hot(category: &str, text: &StringChunked) -> Column {
        let values: Vec<Option<i32>> = text
            .into_iter()
            .map(|value| Some(i32::from(non_blank(value) == Some(category))))
            .collect();
        indicator_column(category, values)
    }
}

impl Transform for AutoDummifier {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        match &self.categories {
            Some(categories) => Ok(TransformOutput::Many(
                categories.iter().map(|c| Self::one_hot(c, &text)).collect(),
            )),
            None => Ok(TransformOutput::Labeled(
                Self::observed(&text)
                    .into_iter()
                    .map(|c| {
                        let column = Self::one_hot(&c, &text);
                        (c, column)
                    })
                    .collect(),
            )),
        }
    }

    fn output_shape(&self) -> OutputShape {
        match &self.categories {
            Some(categories) => OutputShape::Labeled(categories.clone()),
            None => OutputShape::Dynamic,
        }
    }

    fn is_indicator(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(column: &Column) -> Vec<Option<i32>> {
        column.i32().unwrap().into_iter().collect()
    }

    #[test]
    fn test_dopant_dummies() {
        let dummifier = MultiBinaryDummifier::word_bounded(&["Fe", "Co"], false).unwrap();
        let column = Column::new(
            "dopant".into(),
            &["doped with Fe", "no dopant", "Co and Fe"],
        );
        let output = dummifier.apply(&column).unwrap().into_columns();
        assert_eq!(ints(&output[0]), vec![Some(1), Some(0), Some(1)]);
        assert_eq!(ints(&output[1]), vec![Some(0), Some(0), Some(1)]);
        assert_eq!(
            dummifier.output_shape(),
            OutputShape::Labeled(vec!["Fe".into(), "Co".into()])
        );
    }

    #[test]
    fn test_word_bounds_prevent_substring_hits() {
        let dummifier = MultiBinaryDummifier::word_bounded(&["EC", "DEC"], true).unwrap();
        let column = Column::new("solvent".into(), &["LiPF6 in DEC", "EC/DMC"]);
        let output = dummifier.apply(&column).unwrap().into_columns();
        assert_eq!(ints(&output[0]), vec![Some(0), Some(1)]);
        assert_eq!(ints(&output[1]), vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_literal_case_insensitive() {
        let dummifier = MultiBinaryDummifier::literal(&["Sol-gel", "Co-precipitation"], true).unwrap();
        let column = Column::new(
            "method".into(),
            &[Some("sol-gel route"), None, Some("CO-PRECIPITATION then sol-gel")],
        );
        let output = dummifier.apply(&column).unwrap().into_columns();
        assert_eq!(ints(&output[0]), vec![Some(1), Some(0), Some(1)]);
        assert_eq!(ints(&output[1]), vec![Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        assert!(matches!(
            MultiBinaryDummifier::literal(&["Fe", "Fe"], false),
            Err(PipelineError::Configuration { .. })
        ));
        assert!(matches!(
            MultiBinaryDummifier::literal(&[], false),
            Err(PipelineError::Configuration { .. })
        ));
        assert!(matches!(
            AutoDummifier::with_categories(&["x", " x"]),
            Err(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_keyword_groups_are_not_exclusive() {
        let dummifier = KeywordDummifier::new(
            &[
                ("Carbon", &["carbon", "C-coated", "graphene"][..]),
                ("Oxide", &["Al2O3", "ZrO2", "oxide"][..]),
            ],
            true,
        )
        .unwrap();
        let column = Column::new(
            "coating".into(),
            &["graphene + Al2O3", "carbon", "none"],
        );
        let output = dummifier.apply(&column).unwrap().into_columns();
        assert_eq!(ints(&output[0]), vec![Some(1), Some(1), Some(0)]);
        assert_eq!(ints(&output[1]), vec![Some(1), Some(0), Some(0)]);
    }

    #[test]
    fn test_auto_dummifier_discovers_sorted_categories() {
        let dummifier = AutoDummifier::new();
        let column = Column::new(
            "anode".into(),
            &[Some("Li metal"), Some("graphite "), None, Some("Li metal")],
        );
        assert_eq!(dummifier.output_shape(), OutputShape::Dynamic);
        match dummifier.apply(&column).unwrap() {
            TransformOutput::Labeled(columns) => {
                let labels: Vec<&str> = columns.iter().map(|(l, _)| l.as_str()).collect();
                assert_eq!(labels, vec!["Li metal", "graphite"]);
                assert_eq!(
                    ints(&columns[0].1),
                    vec![Some(1), Some(0), Some(0), Some(1)]
                );
                assert_eq!(
                    ints(&columns[1].1),
                    vec![Some(0), Some(1), Some(0), Some(0)]
                );
            }
            other => panic!("Expected labeled output, got {other:?}"),
        }
    }

    #[test]
    fn test_auto_dummifier_fixed_vocabulary() {
        let dummifier = AutoDummifier::with_categories(&["graphite", "Li metal"]).unwrap();
        let column = Column::new("anode".into(), &["Li metal", "silicon"]);
        let output = dummifier.apply(&column).unwrap();
        assert_eq!(output.width(), 2);
        let columns = output.into_columns();
        assert_eq!(ints(&columns[0]), vec![Some(0), Some(0)]);
        assert_eq!(ints(&columns[1]), vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_auto_dummifier_empty_column() {
        let dummifier = AutoDummifier::new();
        let column = Column::new("anode".into(), &[None::<&str>, None]);
        assert_eq!(dummifier.apply(&column).unwrap().width(), 0);
    }
}
