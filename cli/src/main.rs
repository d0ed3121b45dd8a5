#![deny(missing_docs)]

//! # oasdelta CLI
//!
//! Command Line Interface for OpenAPI change analysis.
//!
//! Supported Commands:
//! - `analyze`: Structural diff of two revisions of a document (staged vs `HEAD` by default).
//! - `usages`: Endpoints that depend on a named schema.
//!
//! Reports are written to stdout; logs go to stderr and are filtered with `RUST_LOG`.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;
use crate::git::ShellExecutor;

mod analyze;
mod error;
mod git;
mod output;
mod usages;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI change analysis")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Diff two revisions of an OpenAPI document.
    Analyze(analyze::AnalyzeArgs),
    /// Find the endpoints that use a schema.
    Usages(usages::UsagesArgs),
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let report = match &cli.command {
        Commands::Analyze(args) => analyze::execute(args, ShellExecutor)?,
        Commands::Usages(args) => usages::execute(args)?,
    };
    print!("{report}");

    Ok(())
}
