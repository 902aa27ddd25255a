//! SlotDB CLI
//!
//! Command-line tools for SlotDB data directories.
//!
//! # Commands
//!
//! - `inspect` - Display per-segment statistics
//! - `verify` - Verify segment file integrity
//! - `dump-wal` - Dump WAL entries for debugging

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SlotDB command-line database tools.
#[derive(Parser)]
#[command(name = "slotdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display per-segment statistics
    Inspect,

    /// Verify segment file integrity (headers, slot walk, statuses)
    Verify,

    /// Dump WAL entries for debugging
    DumpWal {
        /// Only dump the WAL of this segment
        #[arg(short, long)]
        segment: Option<usize>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect => {
            let path = cli.path.ok_or("data directory path required for inspect")?;
            commands::inspect::run(&path)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("data directory path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::DumpWal { segment } => {
            let path = cli.path.ok_or("data directory path required for dump-wal")?;
            commands::dump_wal::run(&path, segment)?;
        }
        Commands::Version => {
            println!("SlotDB CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
