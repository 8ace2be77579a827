use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

mod commands;

use commands::contend::ContendArgs;
use commands::drain::DrainArgs;
use commands::show::ShowArgs;

/// Respool Command Line Interface
///
/// Drives an in-process resource pool with concurrent requesters.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,

    /// Pool configuration file (TOML)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Race concurrent requesters for typed resources
    Contend(ContendArgs),

    /// Cycle concurrent callers through the bounded pool
    Drain(DrainArgs),

    /// Print every resource in the configured pool as JSON
    Show(ShowArgs),
}

fn main() {
    let cli = Cli::parse();

    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_str()),
    )
    .try_init();

    let result = match &cli.command {
        Commands::Contend(args) => commands::contend::execute(args, cli.config.as_deref()),
        Commands::Drain(args) => commands::drain::execute(args, cli.config.as_deref()),
        Commands::Show(args) => commands::show::execute(args, cli.config.as_deref()),
    };

    if let Err(err) = result {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}
