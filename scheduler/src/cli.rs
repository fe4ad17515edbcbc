// Command-line interface of the scheduler binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dataflow refresh scheduler
#[derive(Parser, Debug)]
#[command(name = "dataflow-scheduler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml / local.toml
    #[arg(long, env = "DATAFLOW_CONFIG_DIR", default_value = "config", global = true)]
    pub config_dir: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the refresh scheduler until Ctrl+C
    Run,

    /// Run one refresh cycle for a table now and print the outcome
    Refresh {
        /// Table to refresh
        table: String,
    },

    /// Show recent refresh log entries for a table, newest first
    Logs {
        /// Table whose log to show
        table: String,

        /// Maximum number of entries
        #[arg(short, long, default_value_t = 100)]
        limit: i64,
    },
}

impl Cli {
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Run)
    }
}
