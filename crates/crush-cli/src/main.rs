//! crush CLI - CSS preprocessor.
//!
//! Provides commands for:
//! - `compile`: Compile a stylesheet to a cached `.crush.css` file
//! - `string`: Compile stylesheet text to stdout
//! - `clear-cache`: Remove compiled files and the cache index

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ClearCacheArgs, CompileFileArgs, StringArgs};
use output::Output;

/// crush - CSS preprocessor.
#[derive(Parser, Debug)]
#[command(name = "crush", version, about)]
struct Cli {
    /// Enable verbose output (cache decisions, import and alias notices).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a host stylesheet and print its public reference.
    Compile(CompileFileArgs),
    /// Compile stylesheet text from a file or stdin and print the CSS.
    String(StringArgs),
    /// Remove compiled files and the cache index from a directory.
    ClearCache(ClearCacheArgs),
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
        Commands::Compile(args) => args.execute(),
        Commands::String(args) => args.execute(),
        Commands::ClearCache(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
