//! Whole-table removal of degenerate indicator columns.

use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

/// True if the column never holds a non-zero value
fn is_degenerate(column: &Column) -> Result<bool> {
    let values = column.cast(&DataType::Float64)?;
    let live = values
        .f64()?
        .into_iter()
        .any(|value| value.is_some_and(|v| v != 0.0));
    Ok(!live)
}

/// Drop the `candidates` that are zero or null in every row.
///
/// Only the named columns are inspected; numeric outputs where 0 is a real
/// measurement are never candidates. Returns the pruned table and the names
/// removed, in table order. The row count survives even when every column
/// is dropped.
pub fn prune_degenerate_columns(
    table: DataFrame,
    candidates: &[String],
) -> Result<(DataFrame, Vec<String>)> {
    let mut kept = Vec::with_capacity(table.width());
    let mut pruned = Vec::new();

    for column in table.get_columns() {
        let name = column.name().as_str();
        if candidates.iter().any(|c| c == name) && is_degenerate(column)? {
            pruned.push(name.to_string());
        } else {
            kept.push(column.clone());
        }
    }

    if pruned.is_empty() {
        return Ok((table, pruned));
    }
    debug!("Pruned {} degenerate columns: {:?}", pruned.len(), pruned);
    let height = table.height();
    let remaining = if kept.is_empty() {
        DataFrame::empty_with_height(height)
    } else {
        DataFrame::new(kept)?
    };
    Ok((remaining, pruned))
}
