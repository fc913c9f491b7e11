//! Binary crate for the `cityweather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod format;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();

    let directive = filter_directive(
        cmd.verbose,
        cmd.quiet,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr so `--format json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cmd.run().await
}

/// `--quiet` and `--verbose` win over `RUST_LOG`; with neither, `RUST_LOG`
/// applies when set, else `warn`.
fn filter_directive(verbose: bool, quiet: bool, rust_log: Option<String>) -> String {
    if quiet {
        "error".to_string()
    } else if verbose {
        "debug".to_string()
    } else {
        rust_log
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "warn".to_string())
    }
}
