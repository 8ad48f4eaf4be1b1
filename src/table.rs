//! Reading raw tables and writing feature tables.
//!
//! Raw tables are read with schema inference disabled, so every column
//! arrives as text exactly as it was recorded. Feature tables are written as
//! CSV, or as Parquet when the output path ends in `.parquet`.

use crate::config::TableFormat;
use crate::error::Result;
use crate::transformers::{non_blank, text_of};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read a delimited file with a header row, every column as String
pub fn read_raw_table(path: &Path, format: &TableFormat) -> Result<DataFrame> {
    let null_values = (!format.null_values.is_empty()).then(|| {
        NullValues::AllColumns(
            format
                .null_values
                .iter()
                .map(|v| PlSmallStr::from(v.as_str()))
                .collect(),
        )
    });

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| {
            options
                .with_separator(format.delimiter)
                .with_null_values(null_values.clone())
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Output format chosen from a path's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => OutputFormat::Parquet,
            _ => OutputFormat::Csv,
        }
    }
}

/// Write a feature table, creating parent directories as needed
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let format = OutputFormat::from_path(path);

    match format {
        OutputFormat::Csv => {
            let mut writer = BufWriter::new(file);
            CsvWriter::new(&mut writer)
                .include_header(true)
                .finish(df)?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(df)?;
        }
    }

    info!(
        "Wrote {} rows x {} columns to {} ({:?})",
        df.height(),
        df.width(),
        path.display(),
        format
    );
    Ok(())
}

/// Sorted distinct non-blank values per column, in column order.
///
/// Used when authoring a recipe to see how a free-text column is actually
/// filled in.
pub fn unique_values(df: &DataFrame) -> Result<Vec<(String, Vec<String>)>> {
    df.get_columns()
        .iter()
        .map(|column| {
            let text = text_of(column)?;
            let values: BTreeSet<String> = text
                .into_iter()
                .filter_map(non_blank)
                .map(str::to_string)
                .collect();
            Ok((column.name().to_string(), values.into_iter().collect()))
        })
        .collect()
}

/// Write one `<column>.txt` per column with its distinct values, one per line.
///
/// Returns the files written.
pub fn write_unique_values(df: &DataFrame, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for (column, values) in unique_values(df)? {
        let path = dir.join(format!("{}.txt", file_stem(&column)));
        let mut out = BufWriter::new(File::create(&path)?);
        for value in &values {
            writeln!(out, "{value}")?;
        }
        out.flush()?;
        debug!("{} distinct values for '{}'", values.len(), column);
        written.push(path);
    }
    Ok(written)
}

/// Column names often carry units such as "capacity(mAh/g)"
fn file_stem(column: &str) -> String {
    column
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out/features.parquet")),
            OutputFormat::Parquet
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("features.csv")),
            OutputFormat::Csv
        );
        assert_eq!(OutputFormat::from_path(Path::new("features")), OutputFormat::Csv);
    }

    #[test]
    fn test_read_keeps_text_and_nulls() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("raw.csv");
        fs::write(&path, "cycles;capacity\n0100;185 mAh/g\n;NA\n").unwrap();

        let format = TableFormat::default()
            .with_delimiter(b';')
            .with_null_values(&["NA"]);
        let df = read_raw_table(&path, &format).unwrap();

        assert_eq!(df.height(), 2);
        let cycles = df.column("cycles").unwrap();
        assert_eq!(cycles.dtype(), &DataType::String);
        let values: Vec<Option<&str>> = cycles.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("0100"), None]);
        assert_eq!(df.column("capacity").unwrap().null_count(), 1);
    }

    #[test]
    fn test_unique_values_sorted_and_trimmed() {
        let df = df!(
            "anode" => &[Some("Li metal"), Some(" graphite"), None, Some("Li metal")],
            "cycles" => &[Some("100"), Some("50"), Some("  "), None]
        )
        .unwrap();
        let unique = unique_values(&df).unwrap();
        assert_eq!(unique[0].0, "anode");
        assert_eq!(unique[0].1, vec!["Li metal", "graphite"]);
        assert_eq!(unique[1].1, vec!["100", "50"]);
    }

    #[test]
    fn test_write_unique_values_sanitizes_names() {
        let temp_dir = TempDir::new().unwrap();
        let df = df!("capacity(mAh/g)" => &["185", "190"]).unwrap();
        let written = write_unique_values(&df, temp_dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("capacity(mAh_g).txt"));
        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content, "185\n190\n");
    }

    #[test]
    fn test_write_csv_and_parquet() {
        let temp_dir = TempDir::new().unwrap();
        let mut df = df!("Cycles" => &[Some(100i64), None]).unwrap();

        let csv_path = temp_dir.path().join("nested").join("features.csv");
        write_table(&mut df, &csv_path).unwrap();
        let content = fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("Cycles\n100\n"));

        let parquet_path = temp_dir.path().join("features.parquet");
        write_table(&mut df, &parquet_path).unwrap();
        assert!(parquet_path.exists());
    }
}
