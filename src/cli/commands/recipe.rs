//! Recipe command: list a built-in recipe

use crate::cli::args::RecipeArgs;
use crate::recipe::{Recipe, RuleOutputs};
use crate::recipes;
use crate::transformers::Transform;
use anyhow::{Result, anyhow};
use colored::*;

/// One line per rule: input, family, outputs
pub fn describe(recipe: &Recipe) -> Vec<String> {
    let rules = recipe.rules().iter().map(|rule| {
        let outputs = match rule.outputs() {
            RuleOutputs::Declared(names) if names.len() > 4 => format!(
                "{}, {} ... ({} columns)",
                names[0],
                names[1],
                names.len()
            ),
            RuleOutputs::Declared(names) => names.join(", "),
            RuleOutputs::Namespace(prefix) => {
                format!("{} (one per observed value)", RuleOutputs::labeled(prefix, "*"))
            }
        };
        let flag = if rule.transformer().is_indicator() { " [pruned]" } else { "" };
        format!(
            "{} -> {} [{}]{}",
            rule.input_column(),
            outputs,
            rule.transformer().family(),
            flag
        )
    });
    let special = recipe.special_rules().iter().map(|handler| {
        format!(
            "{} -> {} columns [special]",
            handler.input_columns().join(" + "),
            handler.output_columns().len()
        )
    });
    rules.chain(special).collect()
}

pub async fn run_recipe(args: RecipeArgs) -> Result<()> {
    let recipe = recipes::by_name(&args.name)
        .ok_or_else(|| {
            anyhow!(
                "Unknown recipe '{}'; available: {}",
                args.name,
                recipes::AVAILABLE.join(", ")
            )
        })??;

    println!(
        "{} {}",
        "Recipe".bright_green().bold(),
        args.name.bright_cyan()
    );
    for line in describe(&recipe) {
        println!("  {}", line);
    }
    if !recipe.ignored_columns().is_empty() {
        println!(
            "  {} {}",
            "Ignored:".bright_white(),
            recipe.ignored_columns().join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_cathode() {
        let recipe = recipes::cathode_recipe().unwrap();
        let lines = describe(&recipe);
        assert_eq!(lines.len(), recipe.rules().len());
        assert!(lines[0].starts_with("molecular formula -> Fraction_H, Fraction_He"));
        assert!(lines[1].contains("Coating_* (one per observed value)"));
        assert!(lines.iter().any(|l| l == "cycles -> Cycles [number]"));
    }
}
