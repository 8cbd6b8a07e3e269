//! Molang command implementations

use anyhow::Result;
use clap::Subcommand;
use snowstorm_molang::{Context, parse};

#[derive(Subcommand)]
pub enum MolangCommands {
    /// Evaluate an expression and print the result
    Eval {
        /// Expression source
        #[arg(allow_hyphen_values = true)]
        expression: String,

        /// Bind a variable before evaluating, e.g. `v.age=0.5` (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
        vars: Vec<(String, f32)>,

        /// Seed for random functions
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the parsed expression in canonical form
    Parse {
        /// Expression source
        #[arg(allow_hyphen_values = true)]
        expression: String,
    },
}

pub fn execute(command: MolangCommands) -> Result<()> {
    match command {
        MolangCommands::Eval {
            expression,
            vars,
            seed,
        } => eval_command(&expression, &vars, seed),
        MolangCommands::Parse { expression } => parse_command(&expression),
    }
}

fn eval_command(expression: &str, vars: &[(String, f32)], seed: Option<u64>) -> Result<()> {
    let expr = parse(expression);
    let mut ctx = seed.map_or_else(Context::new, Context::with_seed);
    for (name, value) in vars {
        ctx.set(name, *value);
    }

    log::debug!("Evaluating {expr} with {} bound variables", ctx.len());
    println!("{}", expr.evaluate(&mut ctx));
    Ok(())
}

fn parse_command(expression: &str) -> Result<()> {
    let expr = parse(expression);
    if let Some(value) = expr.as_constant() {
        log::info!("Expression folds to the constant {value}");
    }
    println!("{expr}");
    Ok(())
}

/// Parses a `NAME=VALUE` variable binding.
fn parse_binding(raw: &str) -> std::result::Result<(String, f32), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid value for {name}: {e}"))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("v.age=0.5"),
            Ok(("v.age".to_string(), 0.5))
        );
        assert_eq!(
            parse_binding(" variable.size = -2 "),
            Ok(("variable.size".to_string(), -2.0))
        );
        assert!(parse_binding("v.age").is_err());
        assert!(parse_binding("=1").is_err());
        assert!(parse_binding("v.age=fast").is_err());
    }
}
