//! Command implementations for the CLI
//!
//! Each command lives in its own module:
//! - `process`: transform a raw table with a recipe
//! - `unique`: distinct values per column, for recipe authoring
//! - `recipe`: list a built-in recipe

pub mod process;
pub mod recipe;
pub mod shared;
pub mod unique;

use crate::cli::args::{Args, Commands};
use anyhow::Result;

/// Dispatch to the subcommand handler
pub async fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Process(process_args) => process::run_process(process_args).await.map(|_| ()),
        Commands::Unique(unique_args) => unique::run_unique(unique_args).await,
        Commands::Recipe(recipe_args) => recipe::run_recipe(recipe_args).await,
    }
}
