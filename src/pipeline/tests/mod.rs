//! Engine tests
//!
//! Exercises validation, execution, assembly and pruning against small
//! in-memory tables.


use polars::prelude::*;

/// Collect an integer output column
pub fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

/// Collect a float output column
pub fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

pub fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}
