//! Chemical formula parsing into per-element fractions.

use super::{OutputShape, Transform, TransformOutput, non_blank, text_of};
use crate::constants::{CHEMICAL_ELEMENT_SYMBOLS, FRACTION_ROUND_DIGITS, round_to};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::collections::HashMap;

/// Recursive-descent parser for formulas such as `LiNi0.8Co0.1Mn0.1O2`,
/// `Li[Ni0.5Mn0.5]O2` or `Li2(MnO3)0.5`. Slash ratios (`Ni1/3`) are rejected.
struct FormulaParser<'a> {
    chars: Vec<char>,
    pos: usize,
    vocabulary: &'a [String],
}

impl<'a> FormulaParser<'a> {
    fn new(text: &str, vocabulary: &'a [String]) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            vocabulary,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() || c == '·' || c == '-') {
            self.pos += 1;
        }
    }

    fn known(&self, symbol: &str) -> bool {
        self.vocabulary.iter().any(|s| s == symbol)
    }

    /// Subscript after a symbol or group; 1 when absent, `None` when malformed
    fn amount(&mut self) -> Option<f64> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Some(1.0);
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal.parse::<f64>().ok()
    }

    fn symbol(&mut self) -> Option<String> {
        let first = self.peek().filter(char::is_ascii_uppercase)?;
        self.pos += 1;
        if let Some(second) = self.peek().filter(char::is_ascii_lowercase) {
            let pair = format!("{first}{second}");
            if self.known(&pair) {
                self.pos += 1;
                return Some(pair);
            }
        }
        let single = first.to_string();
        self.known(&single).then_some(single)
    }

    /// Parse until end of input or a closing bracket
    fn group(&mut self, depth: usize) -> Option<Vec<(String, f64)>> {
        let mut items: Vec<(String, f64)> = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => return (depth == 0).then_some(items),
                Some(')') | Some(']') => return (depth > 0).then_some(items),
                Some('(') | Some('[') => {
                    let open = self.peek()?;
                    self.pos += 1;
                    let inner = self.group(depth + 1)?;
                    let close = self.peek()?;
                    if (open, close) != ('(', ')') && (open, close) != ('[', ']') {
                        return None;
                    }
                    self.pos += 1;
                    let factor = self.amount()?;
                    items.extend(inner.into_iter().map(|(s, a)| (s, a * factor)));
                }
                Some(_) => {
                    let symbol = self.symbol()?;
                    let amount = self.amount()?;
                    items.push((symbol, amount));
                }
            }
        }
    }
}

/// Parse a formula into `(element, amount)` pairs in first-seen order.
///
/// Repeated elements are summed. Unknown symbols or stray characters make
/// the whole formula unparseable.
pub fn parse_formula(text: &str, vocabulary: &[String]) -> Option<Vec<(String, f64)>> {
    let items = FormulaParser::new(text.trim(), vocabulary).group(0)?;

    let mut merged: Vec<(String, f64)> = Vec::new();
    for (symbol, amount) in items {
        match merged.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, total)) => *total += amount,
            None => merged.push((symbol, amount)),
        }
    }
    (!merged.is_empty()).then_some(merged)
}

/// Rescale amounts into fractions summing to 1.
///
/// Repeated symbols are added together before rescaling. Ratios written as percentages (80:10:10), integers (8:1:1) or fractions
/// (0.8:0.1:0.1) all land on the same scale.
pub fn to_fractions(amounts: &[(String, f64)]) -> Option<HashMap<String, f64>> {
    let total: f64 = amounts.iter().map(|(_, a)| a).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    let mut fractions: HashMap<String, f64> = HashMap::new();
    for (symbol, amount) in amounts {
        *fractions.entry(symbol.clone()).or_insert(0.0) += amount;
    }
    for fraction in fractions.values_mut() {
        *fraction = round_to(*fraction / total, FRACTION_ROUND_DIGITS);
    }
    Some(fractions)
}

/// Build one fraction column per vocabulary element from per-row fractions.
///
/// Rows with `None` are null in every column; parsed rows are 0.0 for
/// elements they do not contain.
pub(crate) fn fraction_columns(
    vocabulary: &[String],
    rows: &[Option<HashMap<String, f64>>],
) -> Vec<Column> {
    vocabulary
        .iter()
        .map(|symbol| {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|row| {
                    row.as_ref()
                        .map(|fractions| fractions.get(symbol).copied().unwrap_or(0.0))
                })
                .collect();
            Column::new(symbol.as_str().into(), values)
        })
        .collect()
}

pub(crate) fn default_vocabulary() -> Vec<String> {
    CHEMICAL_ELEMENT_SYMBOLS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Parses chemical formulas into per-element atomic fractions.
///
/// Emits one `Float64` column per vocabulary element. Elements absent from
/// the whole dataset are left for degenerate-column pruning.
#[derive(Debug, Clone)]
pub struct MolecularFormulaTransformer {
    vocabulary: Vec<String>,
}

impl Default for MolecularFormulaTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl MolecularFormulaTransformer {
    /// All 118 chemical elements
    pub fn new() -> Self {
        Self {
            vocabulary: default_vocabulary(),
        }
    }

    /// Restrict output columns to the given element symbols
    pub fn with_vocabulary(symbols: &[&str]) -> Result<Self> {
        if symbols.is_empty() {
            return Err(PipelineError::configuration(
                "MolecularFormulaTransformer needs a non-empty vocabulary",
            ));
        }
        if let Some(unknown) = symbols
            .iter()
            .find(|s| !CHEMICAL_ELEMENT_SYMBOLS.contains(*s))
        {
            return Err(PipelineError::configuration(format!(
                "'{unknown}' is not a chemical element symbol"
            )));
        }
        Ok(Self {
            vocabulary: symbols.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Transform for MolecularFormulaTransformer {
    fn apply(&self, column: &Column) -> Result<TransformOutput> {
        let text = text_of(column)?;
        let rows: Vec<Option<HashMap<String, f64>>> = text
            .into_iter()
            .map(|value| {
                non_blank(value)
                    .and_then(|v| parse_formula(v, &self.vocabulary))
                    .and_then(|amounts| to_fractions(&amounts))
            })
            .collect();

        Ok(TransformOutput::Many(fraction_columns(
            &self.vocabulary,
            &rows,
        )))
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Labeled(self.vocabulary.clone())
    }

    fn is_indicator(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(text: &str) -> Option<Vec<(String, f64)>> {
        parse_formula(text, &default_vocabulary())
    }

    #[test]
    fn test_simple_formula() {
        let parsed = amounts("LiNi0.8Co0.1Mn0.1O2").unwrap();
        let symbols: Vec<&str> = parsed.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(symbols, vec!["Li", "Ni", "Co", "Mn", "O"]);
        assert_eq!(parsed[1].1, 0.8);
        assert_eq!(parsed[4].1, 2.0);
    }

    #[test]
    fn test_brackets_and_multipliers() {
        let parsed = amounts("Li2(MnO3)0.5").unwrap();
        let mn = parsed.iter().find(|(s, _)| s == "Mn").unwrap().1;
        let o = parsed.iter().find(|(s, _)| s == "O").unwrap().1;
        assert_eq!(mn, 0.5);
        assert_eq!(o, 1.5);

        assert!(amounts("Li[Ni0.5Mn0.5]O2").is_some());
        assert!(amounts("Li(Ni0.5Mn0.5]O2").is_none());
    }

    #[test]
    fn test_repeated_elements_are_summed() {
        let parsed = amounts("OLiO").unwrap();
        assert_eq!(parsed, vec![("O".to_string(), 2.0), ("Li".to_string(), 1.0)]);
    }

    #[test]
    fn test_unknown_symbols_reject_formula() {
        assert!(amounts("NCM811 cathode").is_none());
        assert!(amounts("").is_none());
        assert!(amounts("Xq2").is_none());
    }

    #[test]
    fn test_malformed_amount_rejects_formula() {
        assert!(amounts("LiNi0..8O2").is_none());
        assert!(amounts("Li2(MnO3)0..5").is_none());

        let transformer = MolecularFormulaTransformer::with_vocabulary(&["Li", "Ni", "O"]).unwrap();
        let column = Column::new("formula".into(), &["LiNi0..8O2"]);
        let output = transformer.apply(&column).unwrap().into_columns();
        for fractions in &output {
            assert_eq!(fractions.null_count(), 1);
        }
    }

    #[test]
    fn test_fractions_add_repeated_symbols() {
        let pairs = vec![
            ("Ni".to_string(), 1.0),
            ("Ni".to_string(), 1.0),
            ("Co".to_string(), 2.0),
        ];
        let fractions = to_fractions(&pairs).unwrap();
        assert_eq!(fractions.len(), 2);
        assert_eq!(fractions["Ni"], 0.5);
        assert_eq!(fractions["Co"], 0.5);
    }

    #[test]
    fn test_fractions_sum_to_one() {
        let fractions = to_fractions(&amounts("LiFePO4").unwrap()).unwrap();
        assert_eq!(fractions["Li"], round_to(1.0 / 7.0, 4));
        assert_eq!(fractions["O"], round_to(4.0 / 7.0, 4));
    }

    #[test]
    fn test_transformer_outputs_vocabulary_columns() {
        let transformer = MolecularFormulaTransformer::with_vocabulary(&["Li", "Co", "O"]).unwrap();
        let column = Column::new("formula".into(), &[Some("LiCoO2"), Some("???"), None]);
        let output = transformer.apply(&column).unwrap().into_columns();
        assert_eq!(output.len(), 3);

        let li: Vec<Option<f64>> = output[0].f64().unwrap().into_iter().collect();
        assert_eq!(li, vec![Some(0.25), None, None]);
        let o: Vec<Option<f64>> = output[2].f64().unwrap().into_iter().collect();
        assert_eq!(o, vec![Some(0.5), None, None]);
    }

    #[test]
    fn test_vocabulary_validation() {
        assert!(MolecularFormulaTransformer::with_vocabulary(&[]).is_err());
        assert!(MolecularFormulaTransformer::with_vocabulary(&["Li", "Qq"]).is_err());
        assert!(MolecularFormulaTransformer::new().is_indicator());
    }
}
