//! Shared components for CLI commands
//!
//! Logging setup, progress spinners and run summaries used by more than one
//! command.

use crate::cli::args::LogFormat;
use crate::models::TransformReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Set up structured logging on stderr.
///
/// `RUST_LOG` takes precedence over the level derived from the flags.
pub fn setup_logging(log_level: &str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("labfeat={}", log_level)));
    let layer = fmt::layer().with_writer(std::io::stderr);

    match format {
        LogFormat::Full => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_timer(fmt::time::uptime()).with_target(true))
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.without_time().with_target(false).compact())
            .init(),
    }

    debug!("Logging initialized at level {} ({:?})", log_level, format);
}

/// Spinner for a single long step; hidden when `visible` is false
pub fn spinner(message: &str, visible: bool) -> anyhow::Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Print the run summary to stdout
pub fn print_summary(report: &TransformReport, output: &Path) {
    println!();
    println!("{}", "Transformation complete".bright_green().bold());
    println!(
        "  {} {}",
        "Rows:".bright_white(),
        report.rows.to_string().bright_cyan()
    );
    println!(
        "  {} {} ({} special)",
        "Rules:".bright_white(),
        report.rules_executed.to_string().bright_cyan(),
        report.special_rules_executed
    );
    println!(
        "  {} {} kept of {} emitted",
        "Columns:".bright_white(),
        report.columns_kept().to_string().bright_cyan(),
        report.columns_emitted
    );
    if !report.pruned_columns.is_empty() {
        println!(
            "  {} {}",
            "Pruned:".bright_white(),
            format!("{} degenerate columns", report.pruned_columns.len()).bright_black()
        );
    }
    if !report.parse_warnings.is_empty() {
        println!(
            "  {} {} values left null",
            "Unparsed:".bright_yellow(),
            report.total_unparsed()
        );
        for warning in &report.parse_warnings {
            println!(
                "    {} {}",
                warning.rule.yellow(),
                format!("({})", warning.unparsed).bright_black()
            );
        }
    }
    println!(
        "  {} {:.2?}",
        "Elapsed:".bright_white(),
        report.elapsed
    );
    println!(
        "  {} {}",
        "Output:".bright_white(),
        output.display().to_string().bright_cyan()
    );
}
