//! Concord CLI
//!
//! Bounded verification of composed governance protocols.

use anyhow::Result;
use clap::{Parser, Subcommand};
use concord_cli::{
    handle_enumerate, handle_scenarios, handle_verify, EnumerateArgs, ScenariosArgs, VerifyArgs,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "concord")]
#[command(about = "Concord - bounded verification of composed governance protocols", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify every property of a composition file
    Verify(VerifyArgs),

    /// Run the built-in governance scenarios
    Scenarios(ScenariosArgs),

    /// List the joint states reachable in a composition file
    Enumerate(EnumerateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Verify(args) => {
            handle_verify(&args, &mut out)?;
        }

        Commands::Scenarios(args) => {
            handle_scenarios(&args, &mut out)?;
        }

        Commands::Enumerate(args) => {
            handle_enumerate(&args, &mut out)?;
        }
    }

    Ok(())
}
