//! kstatus CLI library

pub mod commands;
pub mod error;
pub mod input;

pub use error::{Error, Result};

use clap::{Parser, Subcommand, ValueEnum};

/// kstatus - set status and conditions on Kubernetes resources
#[derive(Parser, Debug)]
#[command(name = "kstatus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set status on a resource in the cluster
    Apply(commands::apply::ApplyArgs),
    /// Show what apply would do against an instance document
    Plan(commands::plan::PlanArgs),
    /// Validate a list of conditions
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Apply(args) => commands::apply::run(args).await,
            Commands::Plan(args) => commands::plan::run(args),
            Commands::Validate(args) => commands::validate::run(args),
        }
    }
}
