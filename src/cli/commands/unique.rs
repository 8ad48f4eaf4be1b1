//! Unique command: distinct values per column

use super::shared::setup_logging;
use crate::cli::args::UniqueArgs;
use crate::table::{read_raw_table, write_unique_values};
use anyhow::{Context, Result};
use colored::*;

pub async fn run_unique(args: UniqueArgs) -> Result<()> {
    setup_logging(args.get_log_level(), args.log_format);

    let format = args.table_format()?;
    let table = read_raw_table(&args.input, &format)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let written = write_unique_values(&table, &args.output)
        .with_context(|| format!("Failed to write to {}", args.output.display()))?;

    println!(
        "{} {} columns to {}",
        "Wrote".bright_green().bold(),
        written.len(),
        args.output.display().to_string().bright_cyan()
    );
    Ok(())
}
