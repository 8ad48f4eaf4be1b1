//! Process command: raw table in, feature table out

use super::shared::{print_summary, setup_logging, spinner};
use crate::cli::args::ProcessArgs;
use crate::models::TransformReport;
use crate::pipeline::Pipeline;
use crate::recipes;
use crate::table::{read_raw_table, write_table};
use anyhow::{Context, Result};
use tracing::info;

pub async fn run_process(args: ProcessArgs) -> Result<TransformReport> {
    setup_logging(args.get_log_level(), args.get_log_format());
    args.validate()?;

    let recipe = recipes::by_name(&args.recipe)
        .with_context(|| format!("Unknown recipe '{}'", args.recipe))??;
    let config = args.to_config();
    let format = args.table_format()?;
    info!(
        "Processing {} with recipe '{}' ({} rules)",
        args.input.display(),
        args.recipe,
        recipe.rules().len()
    );

    let table = read_raw_table(&args.input, &format)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let pb = spinner(
        &format!("Transforming {} rows...", table.height()),
        args.show_progress(),
    )?;
    let pipeline = Pipeline::new(recipe).with_config(config.clone());
    let result = if config.concurrent {
        pipeline.transform_concurrent(&table).await
    } else {
        pipeline.transform_with_report(&table)
    };
    pb.finish_and_clear();
    let (mut features, report) = result.context("Transformation failed")?;

    write_table(&mut features, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if !args.quiet {
        print_summary(&report, &args.output);
    }
    Ok(report)
}
