//! Binary entry point for claimgraph.
//!
//! This binary provides the CLI interface for the knowledge-graph store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stdout/print_stderr in main binary for CLI output
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use claimgraph::cli::{self, Cli};
use clap::Parser;

/// Main entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
