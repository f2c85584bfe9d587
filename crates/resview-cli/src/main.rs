mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resview", about = "Browse simulation result files by category")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show item counts per category and the runs of result files
    Info(commands::info::InfoArgs),
    /// Print the rows of one category, optionally selecting some of them
    Browse(commands::browse::BrowseArgs),
    /// Print or save the default view state as TOML
    State(commands::state::StateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Browse(args) => commands::browse::run(args),
        Commands::State(args) => commands::state::run(args),
    }
}
