//! Schema validation, run before any rule executes.

use crate::error::{PipelineError, Result};
use crate::recipe::Recipe;
use polars::prelude::*;
use tracing::debug;

/// Check that the table carries every column the recipe reads.
///
/// All missing columns are reported at once. With `reject_unmapped`, input
/// columns that no rule reads and the recipe does not ignore are an error
/// as well.
pub fn validate_schema(recipe: &Recipe, table: &DataFrame, reject_unmapped: bool) -> Result<()> {
    let present: Vec<&str> = table
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();

    let missing: Vec<String> = recipe
        .input_columns()
        .into_iter()
        .filter(|column| !present.contains(&column.as_str()))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }

    if reject_unmapped {
        let unmapped: Vec<String> = present
            .iter()
            .filter(|column| !recipe.is_mapped(column))
            .map(|column| column.to_string())
            .collect();
        if !unmapped.is_empty() {
            return Err(PipelineError::UnmappedColumns { columns: unmapped });
        }
    }

    debug!(
        "Schema valid: {} input columns, {} rules, {} special rules",
        present.len(),
        recipe.rules().len(),
        recipe.special_rules().len()
    );
    Ok(())
}
