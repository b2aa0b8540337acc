//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Strata - versioned schema migrations
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database URL, e.g. duckdb://app.duckdb
    #[arg(short, long, global = true, env = "MIGRATE_URL")]
    pub url: Option<String>,

    /// Migrations directory (overrides the config file)
    #[arg(short, long, global = true)]
    pub path: Option<String>,

    /// Config file path (default: strata.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Stop on the first Ctrl-C without waiting for the current migration
    #[arg(long, global = true)]
    pub non_graceful: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty up/down migration pair
    Create(CreateArgs),

    /// Apply all pending migrations
    Up,

    /// Revert all applied migrations
    Down,

    /// Revert all migrations, then apply them again
    Reset,

    /// Revert the most recent migration and apply it again
    Redo,

    /// Apply or revert N migrations relative to the current version
    Migrate(MigrateArgs),

    /// Migrate to an absolute version (0 reverts everything)
    Goto(GotoArgs),

    /// Print the current migration version
    Version,

    /// Print every applied migration version
    Versions,

    /// List the available database drivers
    Drivers,
}

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Migration name; words are joined with underscores
    #[arg(required = true, num_args = 1..)]
    pub name: Vec<String>,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Steps to move: positive applies, negative reverts
    #[arg(allow_negative_numbers = true)]
    pub steps: i64,
}

/// Arguments for the goto command
#[derive(Args, Debug)]
pub struct GotoArgs {
    /// Target version
    pub version: u64,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
