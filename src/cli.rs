//! Command-line argument parsing for churn.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Database helpers and synthetic revenue data for the churn project.
#[derive(Parser, Debug)]
#[command(name = "churn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path (must exist when given)
    #[arg(long, value_name = "PATH", env = "CHURN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check the connection by counting the customers
    Check {
        /// Print the result table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate monthly revenue rows for every customer and append them to `revenue`
    GenerateRevenue {
        /// Seed for reproducible output
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Generate rows without writing them
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
