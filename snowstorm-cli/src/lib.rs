//! Snowstorm command-line host
//!
//! Loads particle definition files, evaluates Molang expressions and runs
//! headless simulations for inspection.

pub mod cli;
pub mod commands;
pub mod utils;
