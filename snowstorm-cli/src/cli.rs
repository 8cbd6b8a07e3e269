//! Root CLI structure for snowstorm

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "snowstorm")]
#[command(about = "Evaluate Molang and simulate Bedrock particle effects", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Molang expression tools
    Molang {
        #[command(subcommand)]
        command: crate::commands::molang::MolangCommands,
    },

    /// Particle effect definition tools
    Effect {
        #[command(subcommand)]
        command: crate::commands::effect::EffectCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
