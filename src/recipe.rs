//! Declarative mapping from raw input columns to output features.
//!
//! A [`Recipe`] is an ordered list of rules, each pairing one input column
//! with a transformer and the output names it produces. Output names are
//! resolved and checked for collisions while the recipe is built, so a
//! finished recipe is immutable and safe to share across threads.

use crate::constants::LABEL_SEPARATOR;
use crate::error::{PipelineError, Result};
use crate::special::JointTransform;
use crate::transformers::{OutputShape, Transform, Transformer};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// How a rule names its outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNames {
    /// One name per output, in order
    Exact(Vec<String>),
    /// Derived from the transformer's shape: `name` for a single output,
    /// `name_1..name_n` for fixed widths, `name_<label>` for labeled outputs
    Prefix(String),
}

impl From<&str> for OutputNames {
    fn from(value: &str) -> Self {
        OutputNames::Prefix(value.to_string())
    }
}

impl From<String> for OutputNames {
    fn from(value: String) -> Self {
        OutputNames::Prefix(value)
    }
}

impl From<Vec<String>> for OutputNames {
    fn from(value: Vec<String>) -> Self {
        OutputNames::Exact(value)
    }
}

impl From<Vec<&str>> for OutputNames {
    fn from(value: Vec<&str>) -> Self {
        OutputNames::Exact(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OutputNames {
    fn from(value: [&str; N]) -> Self {
        OutputNames::Exact(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Output names of a rule after resolution against its transformer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutputs {
    /// Names known when the recipe is built
    Declared(Vec<String>),
    /// Data-dependent outputs named `<prefix>_<label>` at execution time
    Namespace(String),
}

impl RuleOutputs {
    /// Resolved output name for a runtime label
    pub fn labeled(prefix: &str, label: &str) -> String {
        format!("{prefix}{LABEL_SEPARATOR}{label}")
    }

    fn resolve(input_column: &str, names: OutputNames, shape: OutputShape) -> Result<Self> {
        match (names, shape) {
            (OutputNames::Exact(names), OutputShape::Dynamic) => {
                Err(PipelineError::configuration(format!(
                    "Rule for '{input_column}' has data-dependent outputs and cannot use the fixed names {names:?}; give it a prefix"
                )))
            }
            (OutputNames::Exact(names), shape) => {
                let expected = shape.width().unwrap_or_default();
                if names.len() != expected {
                    return Err(PipelineError::ArityMismatch {
                        input_column: input_column.to_string(),
                        expected,
                        found: names.len(),
                    });
                }
                Ok(RuleOutputs::Declared(names))
            }
            (OutputNames::Prefix(prefix), OutputShape::Fixed(1)) => {
                Ok(RuleOutputs::Declared(vec![prefix]))
            }
            (OutputNames::Prefix(prefix), OutputShape::Fixed(n)) => Ok(RuleOutputs::Declared(
                (1..=n)
                    .map(|i| Self::labeled(&prefix, &i.to_string()))
                    .collect(),
            )),
            (OutputNames::Prefix(prefix), OutputShape::Labeled(labels)) => {
                Ok(RuleOutputs::Declared(
                    labels.iter().map(|l| Self::labeled(&prefix, l)).collect(),
                ))
            }
            (OutputNames::Prefix(prefix), OutputShape::Dynamic) => {
                Ok(RuleOutputs::Namespace(prefix))
            }
        }
    }
}

/// A single input-to-outputs mapping
#[derive(Debug, Clone)]
pub struct Rule {
    input_column: String,
    outputs: RuleOutputs,
    transformer: Transformer,
}

impl Rule {
    pub fn input_column(&self) -> &str {
        &self.input_column
    }

    pub fn outputs(&self) -> &RuleOutputs {
        &self.outputs
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// Output names known before execution; empty for namespaced rules
    pub fn declared_outputs(&self) -> &[String] {
        match &self.outputs {
            RuleOutputs::Declared(names) => names,
            RuleOutputs::Namespace(_) => &[],
        }
    }
}

/// An immutable, validated set of rules
#[derive(Debug, Clone, Default)]
pub struct Recipe {
    rules: Vec<Rule>,
    special: Vec<Arc<dyn JointTransform>>,
    ignored: Vec<String>,
}

impl Recipe {
    pub fn builder() -> RecipeBuilder {
        RecipeBuilder::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn special_rules(&self) -> &[Arc<dyn JointTransform>] {
        &self.special
    }

    /// Columns that are known to the recipe but deliberately not transformed
    pub fn ignored_columns(&self) -> &[String] {
        &self.ignored
    }

    /// Every column the recipe reads, without duplicates, in first-use order
    pub fn input_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let all = self
            .rules
            .iter()
            .map(|r| r.input_column.clone())
            .chain(self.special.iter().flat_map(|s| s.input_columns()));
        for column in all {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// Declared output names; namespaced rules are listed as `<prefix>_*`
    pub fn output_columns(&self) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| match &rule.outputs {
                RuleOutputs::Declared(names) => names.clone(),
                RuleOutputs::Namespace(prefix) => vec![RuleOutputs::labeled(prefix, "*")],
            })
            .chain(self.special.iter().flat_map(|s| s.output_columns()))
            .collect()
    }

    /// True if the recipe accounts for the column, by rule or by ignoring it
    pub fn is_mapped(&self, column: &str) -> bool {
        self.ignored.iter().any(|c| c == column)
            || self.input_columns().iter().any(|c| c == column)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.special.is_empty()
    }
}

/// Builds a [`Recipe`], rejecting output-name collisions as rules are added
#[derive(Debug, Default)]
pub struct RecipeBuilder {
    recipe: Recipe,
    owners: HashMap<String, String>,
    namespaces: Vec<(String, String)>,
}

impl RecipeBuilder {
    /// Append a rule. The same input column may feed several rules.
    pub fn add(
        &mut self,
        input_column: &str,
        outputs: impl Into<OutputNames>,
        transformer: impl Into<Transformer>,
    ) -> Result<&mut Self> {
        let transformer = transformer.into();
        let outputs = RuleOutputs::resolve(
            input_column,
            outputs.into(),
            transformer.output_shape(),
        )?;

        match &outputs {
            RuleOutputs::Declared(names) => self.claim(names, input_column)?,
            RuleOutputs::Namespace(prefix) => self.reserve(prefix, input_column)?,
        }

        debug!(
            "Added {} rule for '{}' -> {:?}",
            transformer.family(),
            input_column,
            outputs
        );
        self.recipe.rules.push(Rule {
            input_column: input_column.to_string(),
            outputs,
            transformer,
        });
        Ok(self)
    }

    /// Mark a column as intentionally left out of the output
    pub fn ignore(&mut self, column: &str) -> &mut Self {
        if !self.recipe.ignored.iter().any(|c| c == column) {
            self.recipe.ignored.push(column.to_string());
        }
        self
    }

    /// Register a rule that reads several input columns at once
    pub fn special(&mut self, handler: impl JointTransform + 'static) -> Result<&mut Self> {
        let handler: Arc<dyn JointTransform> = Arc::new(handler);
        let names = handler.output_columns();
        self.claim(&names, &handler.name())?;
        self.recipe.special.push(handler);
        Ok(self)
    }

    pub fn build(self) -> Recipe {
        self.recipe
    }

    fn claim(&mut self, names: &[String], rule: &str) -> Result<()> {
        let mut batch: HashSet<&str> = HashSet::new();
        for name in names {
            if let Some(first) = self.owners.get(name) {
                return Err(duplicate(name, first, rule));
            }
            if let Some((_, first)) = self
                .namespaces
                .iter()
                .find(|(prefix, _)| in_namespace(name, prefix))
            {
                return Err(duplicate(name, first, rule));
            }
            if !batch.insert(name.as_str()) {
                return Err(duplicate(name, rule, rule));
            }
        }
        for name in names {
            self.owners.insert(name.clone(), rule.to_string());
        }
        Ok(())
    }

    fn reserve(&mut self, prefix: &str, rule: &str) -> Result<()> {
        let namespace = RuleOutputs::labeled(prefix, "*");
        if let Some((_, first)) = self
            .namespaces
            .iter()
            .find(|(other, _)| {
                other == prefix || in_namespace(prefix, other) || in_namespace(other, prefix)
            })
        {
            return Err(duplicate(&namespace, first, rule));
        }
        if let Some((_, first)) = self
            .owners
            .iter()
            .find(|(name, _)| in_namespace(name, prefix))
        {
            return Err(duplicate(&namespace, first, rule));
        }
        self.namespaces.push((prefix.to_string(), rule.to_string()));
        Ok(())
    }
}

fn in_namespace(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(LABEL_SEPARATOR))
}

fn duplicate(name: &str, first_rule: &str, second_rule: &str) -> PipelineError {
    PipelineError::DuplicateOutput {
        name: name.to_string(),
        first_rule: first_rule.to_string(),
        second_rule: second_rule.to_string(),
    }
}
