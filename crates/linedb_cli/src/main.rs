//! LineDB CLI
//!
//! Command-line tools for LineDB data files.
//!
//! # Commands
//!
//! - `inspect` - Display per-type counters and record counts
//! - `verify` - Check the file for malformed lines and identity problems
//! - `dump` - Print records with their values unescaped

mod commands;

use clap::{Parser, Subcommand};
use linedb_core::TextEncoding;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LineDB command-line tools.
#[derive(Parser)]
#[command(name = "linedb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data file
    #[arg(global = true, short, long, default_value = linedb_core::DEFAULT_PATH)]
    path: PathBuf,

    /// Encoding of the data file (utf-8, iso-8859-1)
    #[arg(global = true, short, long, default_value = "utf-8")]
    encoding: TextEncoding,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display per-type counters and record counts
    Inspect {
        /// List the property names seen for each type
        #[arg(long)]
        properties: bool,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check the data file for problems
    Verify,

    /// Print records with unescaped values
    Dump {
        /// Only print records of this type
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
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
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { properties, format } => {
            commands::inspect::run(&cli.path, cli.encoding, properties, &format)?;
        }
        Commands::Verify => {
            commands::verify::run(&cli.path, cli.encoding)?;
        }
        Commands::Dump {
            type_name,
            limit,
            format,
        } => {
            commands::dump::run(
                &cli.path,
                cli.encoding,
                type_name.as_deref(),
                limit,
                &format,
            )?;
        }
        Commands::Version => {
            println!("LineDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("LineDB Core v{}", linedb_core::VERSION);
        }
    }

    Ok(())
}
