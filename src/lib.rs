//! Laboratory record feature extraction
//!
//! Turns tables of free-text, human-authored laboratory records (for example
//! "annealing temperature: 750°C for 4h; 900°C for 10h") into clean, typed
//! feature columns for statistical modeling.
//!
//! The library provides:
//! - Configurable transformers for numbers, temperatures, keyword flags,
//!   one-hot categories and chemical formulas
//! - Declarative recipes binding input columns to named outputs, checked for
//!   collisions when they are built
//! - A pipeline engine that validates, executes (optionally concurrently),
//!   assembles and prunes degenerate indicator columns
//! - Table I/O helpers and built-in recipes used by the `labfeat` binary

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod recipe;
pub mod recipes;
pub mod special;
pub mod table;
pub mod transformers;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{PipelineConfig, TableFormat};
pub use error::{PipelineError, Result};
pub use models::{NumberKind, ParseWarning, TemperatureUnit, TransformReport};
pub use pipeline::Pipeline;
pub use recipe::{OutputNames, Recipe, RecipeBuilder};
pub use special::{CompositionRatioHandler, JointTransform};
pub use transformers::{Transform, TransformOutput, Transformer};
