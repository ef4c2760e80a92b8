//! quire CLI - layered content resolution.
//!
//! Provides commands for:
//! - `resolve`: Resolve a request path to a page, asset or error page
//! - `hash`: Print the content hash of a path
//! - `ls`: List content files or directories matching a glob

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{HashArgs, LsArgs, ResolveArgs};
use output::Output;

/// quire - layered content resolution engine.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a request path and print the response.
    Resolve(ResolveArgs),
    /// Print the content hash of a path.
    Hash(HashArgs),
    /// List content matching a glob pattern.
    Ls(LsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Resolve(args) => args.execute(&output),
        Commands::Hash(args) => args.execute(&output),
        Commands::Ls(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
