//! Strata CLI - versioned schema migrations

use anyhow::Result;
use clap::Parser;
use st_core::Version;
use st_migrate::Operation;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{apply, create, drivers, version};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = dispatch(&cli).await {
        match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::exit(*code),
            None => {
                eprintln!("{} {:#}", console::style("Error:").red().bold(), err);
                std::process::exit(1);
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn dispatch(cli: &Cli) -> Result<()> {
    let global = &cli.global;
    match &cli.command {
        Commands::Create(args) => create::execute(args, global),
        Commands::Up => apply::execute(Operation::Up, global).await,
        Commands::Down => apply::execute(Operation::Down, global).await,
        Commands::Reset => apply::execute(Operation::Reset, global).await,
        Commands::Redo => apply::execute(Operation::Redo, global).await,
        Commands::Migrate(args) => apply::execute(Operation::Migrate(args.steps), global).await,
        Commands::Goto(args) => {
            apply::execute(Operation::Goto(Version::new(args.version)), global).await
        }
        Commands::Version => version::execute_version(global).await,
        Commands::Versions => version::execute_versions(global).await,
        Commands::Drivers => drivers::execute(),
    }
}
