//! Command-line argument definitions
//!
//! The complete CLI interface using the clap derive API.

use crate::config::{PipelineConfig, TableFormat};
use crate::error::Result;
use crate::recipes;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Turn free-text laboratory records into numeric feature tables
#[derive(Debug, Clone, Parser)]
#[command(
    name = "labfeat",
    version,
    about = "Turn free-text laboratory records into numeric feature tables",
    long_about = "Applies a declarative recipe of column rules to a raw CSV export of \
                  laboratory records. Each rule extracts numbers, temperatures, keyword \
                  flags or chemical compositions from one text column and the results \
                  are assembled into a typed feature table written as CSV or Parquet."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Transform a raw table with a recipe
    Process(ProcessArgs),
    /// Write the distinct values of every column, for recipe authoring
    Unique(UniqueArgs),
    /// List the rules of a built-in recipe
    Recipe(RecipeArgs),
}

/// Shape of log lines on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Uptime, level and module on every line
    #[default]
    Full,
    /// Level and message only
    Compact,
}

/// Arguments for the process command
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Raw delimited table with a header row
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file; a `.parquet` extension writes Parquet, anything else CSV
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: PathBuf,

    /// Built-in recipe to apply
    #[arg(short = 'r', long = "recipe", default_value = "cathode")]
    pub recipe: String,

    /// Field delimiter of the input table (`\t` for tabs)
    #[arg(short = 'd', long = "delimiter", default_value = ",")]
    pub delimiter: String,

    /// Extra field values to read as missing (comma-separated)
    #[arg(long = "null-values", value_delimiter = ',')]
    pub null_values: Vec<String>,

    /// Run rules concurrently on worker threads
    #[arg(long = "concurrent")]
    pub concurrent: bool,

    /// Number of rules in flight with --concurrent (default: number of CPUs)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Keep indicator columns that are zero in every row
    #[arg(long = "no-prune")]
    pub no_prune: bool,

    /// Do not fail on input columns the recipe does not know
    #[arg(long = "allow-unmapped")]
    pub allow_unmapped: bool,

    /// Log line layout
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Arguments for the unique command
#[derive(Debug, Clone, Parser)]
pub struct UniqueArgs {
    /// Raw delimited table with a header row
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving one `<column>.txt` per column
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output: PathBuf,

    /// Log line layout
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    /// Field delimiter of the input table (`\t` for tabs)
    #[arg(short = 'd', long = "delimiter", default_value = ",")]
    pub delimiter: String,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,
}

/// Arguments for the recipe command
#[derive(Debug, Clone, Parser)]
pub struct RecipeArgs {
    /// Built-in recipe to list
    #[arg(default_value = "cathode")]
    pub name: String,
}

/// Determine the log level from verbosity flags
pub fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

impl ProcessArgs {
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }

    /// Quiet runs always log compactly
    pub fn get_log_format(&self) -> LogFormat {
        if self.quiet {
            LogFormat::Compact
        } else {
            self.log_format
        }
    }

    /// Progress spinners are hidden in quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    pub fn table_format(&self) -> Result<TableFormat> {
        let nulls: Vec<&str> = self.null_values.iter().map(String::as_str).collect();
        Ok(TableFormat::default()
            .with_delimiter(TableFormat::parse_delimiter(&self.delimiter)?)
            .with_null_values(&nulls))
    }

    /// Build the pipeline configuration from the flags
    pub fn to_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if self.concurrent {
            config = config.with_concurrency();
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.no_prune {
            config = config.without_pruning();
        }
        if self.allow_unmapped {
            config = config.allow_unmapped();
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        if !recipes::AVAILABLE.contains(&self.recipe.as_str()) {
            return Err(crate::error::PipelineError::configuration(format!(
                "Unknown recipe '{}'; available: {}",
                self.recipe,
                recipes::AVAILABLE.join(", ")
            )));
        }
        self.table_format()?;
        self.to_config().validate()
    }
}

impl UniqueArgs {
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, false)
    }

    pub fn table_format(&self) -> Result<TableFormat> {
        Ok(TableFormat::default().with_delimiter(TableFormat::parse_delimiter(&self.delimiter)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_args_parsing() {
        let args = Args::try_parse_from([
            "labfeat",
            "process",
            "raw.csv",
            "-o",
            "features.parquet",
            "--concurrent",
            "-w",
            "3",
            "--no-prune",
            "-d",
            ";",
            "--null-values",
            "NA,n/a",
            "-vv",
        ])
        .unwrap();

        match args.command {
            Commands::Process(process) => {
                assert_eq!(process.input, PathBuf::from("raw.csv"));
                assert_eq!(process.recipe, "cathode");
                assert_eq!(process.get_log_level(), "debug");

                let config = process.to_config();
                assert!(config.concurrent);
                assert_eq!(config.workers, 3);
                assert!(!config.prune_degenerate);
                assert!(config.reject_unmapped);

                let format = process.table_format().unwrap();
                assert_eq!(format.delimiter, b';');
                assert_eq!(format.null_values, vec!["NA", "n/a"]);
                assert!(process.validate().is_ok());
            }
            other => panic!("Expected process command, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_recipe_rejected() {
        let args =
            Args::try_parse_from(["labfeat", "process", "raw.csv", "-o", "out.csv", "-r", "anode"])
                .unwrap();
        match args.command {
            Commands::Process(process) => assert!(process.validate().is_err()),
            other => panic!("Expected process command, got {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(
            Args::try_parse_from(["labfeat", "process", "a.csv", "-o", "b.csv", "-q", "-v"])
                .is_err()
        );
        assert_eq!(log_level(0, true), "error");
        assert_eq!(log_level(0, false), "warn");
        assert_eq!(log_level(5, false), "trace");
    }

    #[test]
    fn test_log_format_selection() {
        let args = Args::try_parse_from([
            "labfeat",
            "process",
            "a.csv",
            "-o",
            "b.csv",
            "--log-format",
            "compact",
        ])
        .unwrap();
        match args.command {
            Commands::Process(process) => assert_eq!(process.get_log_format(), LogFormat::Compact),
            other => panic!("Expected process command, got {other:?}"),
        }

        let args = Args::try_parse_from(["labfeat", "process", "a.csv", "-o", "b.csv", "-q"]).unwrap();
        match args.command {
            Commands::Process(process) => {
                assert_eq!(process.log_format, LogFormat::Full);
                assert_eq!(process.get_log_format(), LogFormat::Compact);
            }
            other => panic!("Expected process command, got {other:?}"),
        }

        let args = Args::try_parse_from(["labfeat", "unique", "a.csv", "-o", "dir"]).unwrap();
        match args.command {
            Commands::Unique(unique) => assert_eq!(unique.log_format, LogFormat::Full),
            other => panic!("Expected unique command, got {other:?}"),
        }
    }

    #[test]
    fn test_recipe_default_name() {
        let args = Args::try_parse_from(["labfeat", "recipe"]).unwrap();
        match args.command {
            Commands::Recipe(recipe) => assert_eq!(recipe.name, "cathode"),
            other => panic!("Expected recipe command, got {other:?}"),
        }
    }
}
