//! Pipeline engine.
//!
//! A run is a single linear pass over one input table:
//! validate, execute every rule in recipe order, run the joint special-case
//! rules, assemble, prune. Any structural failure aborts the whole run and no
//! partial table is returned. The input table is never modified.

pub mod prune;
pub mod validate;

#[cfg(test)]
mod tests;

pub use prune::prune_degenerate_columns;
pub use validate::validate_schema;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::{ParseWarning, TransformReport};
use crate::recipe::{Recipe, Rule, RuleOutputs};
use crate::special::JointTransform;
use crate::transformers::{Transform, TransformOutput, non_blank, text_of};
use futures::stream::{self, StreamExt, TryStreamExt};
use polars::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, info, warn};

/// Columns produced by one rule, renamed and checked
#[derive(Debug)]
struct RuleResult {
    rule: String,
    columns: Vec<Column>,
    indicator: bool,
    unparsed: usize,
}

/// Executes a [`Recipe`] against input tables
#[derive(Debug, Clone)]
pub struct Pipeline {
    recipe: Arc<Recipe>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe: Arc::new(recipe),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Transform `table` into the feature table
    pub fn transform(&self, table: &DataFrame) -> Result<DataFrame> {
        self.transform_with_report(table).map(|(df, _)| df)
    }

    /// Transform `table`, also returning run statistics
    pub fn transform_with_report(&self, table: &DataFrame) -> Result<(DataFrame, TransformReport)> {
        let start = Instant::now();
        self.config.validate()?;
        validate_schema(&self.recipe, table, self.config.reject_unmapped)?;

        let rows = table.height();
        let report_warnings = self.config.report_parse_warnings;
        let results = self
            .recipe
            .rules()
            .iter()
            .map(|rule| {
                let column = table.column(rule.input_column())?;
                run_rule(rule, column, rows, report_warnings)
            })
            .collect::<Result<Vec<_>>>()?;

        self.finish(table, results, start)
    }

    /// Transform `table` with rules fanned out over blocking worker tasks.
    ///
    /// Up to `workers` rules run at once; results are collected in recipe
    /// order, so the output is identical to [`transform_with_report`](Self::transform_with_report).
    pub async fn transform_concurrent(
        &self,
        table: &DataFrame,
    ) -> Result<(DataFrame, TransformReport)> {
        let start = Instant::now();
        self.config.validate()?;
        validate_schema(&self.recipe, table, self.config.reject_unmapped)?;

        let rows = table.height();
        let report_warnings = self.config.report_parse_warnings;
        let workers = self.config.workers;
        debug!(
            "Running {} rules on up to {} workers",
            self.recipe.rules().len(),
            workers
        );

        let tasks = (0..self.recipe.rules().len())
            .map(|index| {
                let recipe = Arc::clone(&self.recipe);
                let column = recipe.rules()[index].input_column().to_string();
                table.column(&column).cloned().map(|column| (recipe, index, column))
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        let results: Vec<RuleResult> = stream::iter(tasks)
            .map(|(recipe, index, column)| async move {
                let joined = task::spawn_blocking(move || {
                    run_rule(&recipe.rules()[index], &column, rows, report_warnings)
                })
                .await;
                match joined {
                    Ok(result) => result,
                    Err(e) => Err(PipelineError::TaskFailed {
                        reason: e.to_string(),
                    }),
                }
            })
            .buffered(workers)
            .try_collect()
            .await?;

        self.finish(table, results, start)
    }

    /// Special-case pass, assembly, pruning and reporting
    fn finish(
        &self,
        table: &DataFrame,
        mut results: Vec<RuleResult>,
        start: Instant,
    ) -> Result<(DataFrame, TransformReport)> {
        let rows = table.height();
        for handler in self.recipe.special_rules() {
            results.push(run_special(handler.as_ref(), table, rows)?);
        }

        let mut report = TransformReport {
            rows,
            rules_executed: self.recipe.rules().len(),
            special_rules_executed: self.recipe.special_rules().len(),
            ..Default::default()
        };

        let mut owners: HashMap<String, String> = HashMap::new();
        let mut columns = Vec::new();
        let mut candidates = Vec::new();
        for result in results {
            if result.unparsed > 0 {
                warn!(
                    "Rule '{}': {} non-empty values could not be parsed",
                    result.rule, result.unparsed
                );
                report.parse_warnings.push(ParseWarning {
                    rule: result.rule.clone(),
                    unparsed: result.unparsed,
                });
            }
            for column in result.columns {
                let name = column.name().to_string();
                if let Some(first) = owners.insert(name.clone(), result.rule.clone()) {
                    return Err(PipelineError::DuplicateOutput {
                        name,
                        first_rule: first,
                        second_rule: result.rule,
                    });
                }
                if result.indicator {
                    candidates.push(name);
                }
                columns.push(column);
            }
        }
        report.columns_emitted = columns.len();

        let assembled = if columns.is_empty() {
            DataFrame::empty_with_height(rows)
        } else {
            DataFrame::new(columns)?
        };
        let output = if self.config.prune_degenerate {
            let (pruned_table, pruned) = prune_degenerate_columns(assembled, &candidates)?;
            report.pruned_columns = pruned;
            pruned_table
        } else {
            assembled
        };

        report.elapsed = start.elapsed();
        info!(
            "Transformed {} rows: {} columns emitted, {} pruned, {} unparsed values in {:.2?}",
            report.rows,
            report.columns_emitted,
            report.pruned_columns.len(),
            report.total_unparsed(),
            report.elapsed
        );
        Ok((output, report))
    }
}

/// Apply one rule to its bound column and name the outputs
fn run_rule(rule: &Rule, column: &Column, rows: usize, report_warnings: bool) -> Result<RuleResult> {
    let input = rule.input_column();
    let transformer = rule.transformer();
    debug!("Applying {} rule to '{}'", transformer.family(), input);

    let output = transformer.apply(column)?;
    let columns = match rule.outputs() {
        RuleOutputs::Declared(names) => {
            let found = output.width();
            if found != names.len() {
                return Err(PipelineError::ArityMismatch {
                    input_column: input.to_string(),
                    expected: names.len(),
                    found,
                });
            }
            output
                .into_columns()
                .into_iter()
                .zip(names)
                .map(|(column, name)| column.with_name(name.as_str().into()))
                .collect::<Vec<_>>()
        }
        RuleOutputs::Namespace(prefix) => namespaced(prefix, output),
    };

    check_rows(input, &columns, rows)?;

    let unparsed = if report_warnings {
        count_unparsed(column, &columns)?
    } else {
        0
    };

    Ok(RuleResult {
        rule: input.to_string(),
        columns,
        indicator: transformer.is_indicator(),
        unparsed,
    })
}

/// Name runtime-labeled outputs under the rule's prefix
fn namespaced(prefix: &str, output: TransformOutput) -> Vec<Column> {
    let labeled: Vec<(String, Column)> = match output {
        TransformOutput::Labeled(pairs) => pairs,
        other => other
            .into_columns()
            .into_iter()
            .map(|column| (column.name().to_string(), column))
            .collect(),
    };
    labeled
        .into_iter()
        .map(|(label, column)| column.with_name(RuleOutputs::labeled(prefix, &label).into()))
        .collect()
}

fn run_special(handler: &dyn JointTransform, table: &DataFrame, rows: usize) -> Result<RuleResult> {
    let name = handler.name();
    debug!("Applying special rule '{}'", name);

    let expected = handler.output_columns();
    let columns = handler.apply(table)?;
    if columns.len() != expected.len() {
        return Err(PipelineError::ArityMismatch {
            input_column: name,
            expected: expected.len(),
            found: columns.len(),
        });
    }
    let columns: Vec<Column> = columns
        .into_iter()
        .zip(expected)
        .map(|(column, name)| column.with_name(name.into()))
        .collect();
    check_rows(&name, &columns, rows)?;

    Ok(RuleResult {
        rule: name,
        columns,
        indicator: handler.is_indicator(),
        unparsed: 0,
    })
}

fn check_rows(rule: &str, columns: &[Column], rows: usize) -> Result<()> {
    match columns.iter().find(|c| c.len() != rows) {
        Some(column) => Err(PipelineError::RowCountMismatch {
            input_column: rule.to_string(),
            expected: rows,
            found: column.len(),
        }),
        None => Ok(()),
    }
}

/// Rows with a non-blank input whose outputs are all null
fn count_unparsed(input: &Column, outputs: &[Column]) -> Result<usize> {
    if outputs.is_empty() {
        return Ok(0);
    }
    let text = text_of(input)?;
    let null_masks: Vec<BooleanChunked> = outputs.iter().map(|c| c.is_null()).collect();

    Ok(text
        .into_iter()
        .enumerate()
        .filter(|(row, value)| {
            non_blank(*value).is_some()
                && null_masks
                    .iter()
                    .all(|mask| mask.get(*row).unwrap_or(false))
        })
        .count())
}
