//! Column transformers.
//!
//! A transformer maps one raw text column to a fixed (or, for dynamic
//! one-hot encoding, data-dependent) set of typed output columns. Built-in
//! families are configured by data, not by new types; anything else plugs in
//! through [`Transform`] and [`Transformer::Custom`].

pub mod binary;
pub mod dummy;
pub mod formula;
pub mod number;
pub mod temperature;

pub use binary::BinaryTransformer;
pub use dummy::{AutoDummifier, KeywordDummifier, MultiBinaryDummifier};
pub use formula::MolecularFormulaTransformer;
pub use number::{MultiNumberExtractor, NumberExtractor};
pub use temperature::MultiTemperatureExtractor;

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

/// Width of a transformer's output, as far as it is known before execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputShape {
    /// A fixed number of unlabeled outputs
    Fixed(usize),
    /// Fixed width with a label per output, used as column-name suffixes
    Labeled(Vec<String>),
    /// Width decided by the data seen at execution time
    Dynamic,
}

impl OutputShape {
    /// Number of outputs, if known before execution
    pub fn width(&self) -> Option<usize> {
        match self {
            OutputShape::Fixed(n) => Some(*n),
            OutputShape::Labeled(labels) => Some(labels.len()),
            OutputShape::Dynamic => None,
        }
    }
}

/// Result of applying a transformer to a column
#[derive(Debug, Clone)]
pub enum TransformOutput {
    Single(Column),
    Many(Vec<Column>),
    /// Outputs labeled from runtime-observed data
    Labeled(Vec<(String, Column)>),
}

impl TransformOutput {
    pub fn width(&self) -> usize {
        match self {
            TransformOutput::Single(_) => 1,
            TransformOutput::Many(columns) => columns.len(),
            TransformOutput::Labeled(columns) => columns.len(),
        }
    }

    /// Flatten into columns, dropping runtime labels
    pub fn into_columns(self) -> Vec<Column> {
        match self {
            TransformOutput::Single(column) => vec![column],
            TransformOutput::Many(columns) => columns,
            TransformOutput::Labeled(columns) => columns.into_iter().map(|(_, c)| c).collect(),
        }
    }
}

/// Capability shared by every transformer.
///
/// Implementations must be deterministic and must not look across rows,
/// except for whole-column category discovery by dynamic one-hot encoders.
pub trait Transform: fmt::Debug + Send + Sync {
    fn apply(&self, column: &Column) -> Result<TransformOutput>;

    fn output_shape(&self) -> OutputShape;

    /// Indicator-style outputs are candidates for degenerate-column pruning
    fn is_indicator(&self) -> bool {
        false
    }
}

/// The built-in transformer families
#[derive(Debug, Clone)]
pub enum Transformer {
    Binary(BinaryTransformer),
    Number(NumberExtractor),
    MultiNumber(MultiNumberExtractor),
    MultiTemperature(MultiTemperatureExtractor),
    MultiBinary(MultiBinaryDummifier),
    Keyword(KeywordDummifier),
    Auto(AutoDummifier),
    Formula(MolecularFormulaTransformer),
    Custom(Arc<dyn Transform>),
}

impl Transformer {
    /// Short family name for logs and recipe listings
    pub fn family(&self) -> &'static str {
        match self {
            Transformer::Binary(_) => "binary",
            Transformer::Number(_) => "number",
            Transformer::MultiNumber(_) => "multi-number",
            Transformer::MultiTemperature(_) => "multi-temperature",
            Transformer::MultiBinary(_) => "multi-binary",
            Transformer::Keyword(_) => "keyword",
            Transformer::Auto(_) => "auto-dummy",
            Transformer::Formula(_) => "formula",
            Transformer::Custom(_) => "custom",
        }
    }

    fn inner(&self) -> &dyn Transform {
        match self {
            Transformer::Binary(t) => t,
            Transformer::Number(t) => t,
            Transformer::MultiNumber(t) => t,
            Transformer::MultiTemperature(t) => t,
            Transformer::MultiBinary(t) => t,
            Transformer::Keyword(t) => t,
            Transformer::Auto(t) => t,
            Transformer::Formula(t) => t,
            Transformer::Custom(t) => t.as_ref(),
        }
    }
}

impl Transform for Transformer {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        self.inner().apply(column)
    }

    fn output_shape(&self) -> OutputShape {
        self.inner().output_shape()
    }

    fn is_indicator(&self) -> bool {
        self.inner().is_indicator()
    }
}

macro_rules! impl_from_transformer {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Transformer {
                fn from(value: $ty) -> Self {
                    Transformer::$variant(value)
                }
            }
        )*
    };
}

impl_from_transformer! {
    BinaryTransformer => Binary,
    NumberExtractor => Number,
    MultiNumberExtractor => MultiNumber,
    MultiTemperatureExtractor => MultiTemperature,
    MultiBinaryDummifier => MultiBinary,
    KeywordDummifier => Keyword,
    AutoDummifier => Auto,
    MolecularFormulaTransformer => Formula,
}

impl From<Arc<dyn Transform>> for Transformer {
    fn from(value: Arc<dyn Transform>) -> Self {
        Transformer::Custom(value)
    }
}

/// Compile a pattern, reporting the offending pattern on failure
pub(crate) fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| PipelineError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// View any column as text; raw tables are all-string but callers may pass
/// already-typed columns
pub(crate) fn text_of(column: &Column) -> Result<StringChunked> {
    let text = column.cast(&DataType::String)?;
    Ok(text.str()?.clone())
}

/// Treat null and whitespace-only values alike
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Value of the first capture group, or the whole match when there is none
pub(crate) fn capture_text<'t>(captures: &regex::Captures<'t>) -> Option<&'t str> {
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str())
}

/// Build a 0/1 indicator column
pub(crate) fn indicator_column(name: &str, values: Vec<Option<i32>>) -> Column {
    Column::new(name.into(), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Upper;

    impl Transform for Upper {
        fn apply(&self, column: &Column) -> Result<TransformOutput> {
            let text = text_of(column)?;
            let values: Vec<Option<String>> = text
                .into_iter()
                .map(|v| v.map(str::to_uppercase))
                .collect();
            Ok(TransformOutput::Single(Column::new("upper".into(), values)))
        }

        fn output_shape(&self) -> OutputShape {
            OutputShape::Fixed(1)
        }
    }

    #[test]
    fn test_custom_transformer_dispatch() {
        let transformer = Transformer::from(Arc::new(Upper) as Arc<dyn Transform>);
        assert_eq!(transformer.family(), "custom");
        assert_eq!(transformer.output_shape().width(), Some(1));
        assert!(!transformer.is_indicator());

        let column = Column::new("raw".into(), &["abc"]);
        let output = transformer.apply(&column).unwrap();
        assert_eq!(output.width(), 1);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = compile("(unclosed", false).unwrap_err();
        match err {
            PipelineError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("Expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_shape_width() {
        assert_eq!(OutputShape::Fixed(3).width(), Some(3));
        assert_eq!(
            OutputShape::Labeled(vec!["a".into(), "b".into()]).width(),
            Some(2)
        );
        assert_eq!(OutputShape::Dynamic.width(), None);
    }
}
