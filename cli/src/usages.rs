#![deny(missing_docs)]

//! # Usages Command
//!
//! Lists the endpoints of a working-tree document that reach a named schema,
//! with the parameter, request body and response slots they reach it through.

use crate::error::CliResult;
use crate::output::{render, OutputFormat};
use oasdelta_core::schema_usage_report;
use std::fs;
use std::path::PathBuf;

/// Arguments for the usages command.
#[derive(clap::Args, Debug, Clone)]
pub struct UsagesArgs {
    /// Path to the OpenAPI document, relative to `--repo` unless absolute.
    pub file: PathBuf,

    /// Name of the schema under `components/schemas`.
    pub schema: String,

    /// Directory the document path is resolved against.
    #[clap(long, env = "OASDELTA_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Report format.
    #[clap(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Executes the usage search and returns the rendered report.
pub fn execute(args: &UsagesArgs) -> CliResult<String> {
    let path = args.repo.join(&args.file);
    let text = fs::read_to_string(&path)?;

    let report = schema_usage_report(&text, &args.schema)?;
    if !report.defined {
        tracing::warn!(schema = %args.schema, "schema is not defined in the document");
    }
    tracing::info!(
        file = %path.display(),
        endpoints = report.total_affected_endpoints,
        "usage search complete"
    );
    render(&report, args.format)
}
