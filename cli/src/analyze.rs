#![deny(missing_docs)]

//! # Analyze Command
//!
//! Diffs two revisions of an OpenAPI document and prints the change report.
//!
//! Revisions come from one of three places:
//! 1. **Staged** (default): the index against `HEAD`. The file must be staged.
//! 2. **Revisions**: `--from REV --to REV`, any two git revisions.
//! 3. **Baseline file**: `--baseline FILE` against the file on disk, no git involved.
//!
//! A revision in which the file does not exist counts as an empty document, so a
//! newly added file reports everything as added.

use crate::error::{CliError, CliResult};
use crate::git::{CommandExecutor, GitRepo};
use crate::output::{render, OutputFormat};
use oasdelta_core::{compare_documents, parse_document, DocumentModel};
use std::fs;
use std::path::PathBuf;

/// Arguments for the analyze command.
#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Path to the OpenAPI document (repository-relative, or absolute inside the repository).
    pub file: PathBuf,

    /// Git repository to read revisions from.
    #[clap(long, env = "OASDELTA_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Compare the staged revision against HEAD (the default).
    #[clap(long, conflicts_with_all = ["from", "to", "baseline"])]
    pub staged: bool,

    /// Baseline git revision.
    #[clap(long, requires = "to", conflicts_with = "baseline")]
    pub from: Option<String>,

    /// Working git revision.
    #[clap(long, requires = "from", conflicts_with = "baseline")]
    pub to: Option<String>,

    /// Compare `file` on disk against this baseline file instead of using git.
    #[clap(long)]
    pub baseline: Option<PathBuf>,

    /// Report format.
    #[clap(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Include the endpoints affected by each changed schema.
    #[clap(long)]
    pub impact: bool,
}

/// Where the two revisions are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Staged,
    Revisions { from: String, to: String },
    BaselineFile(PathBuf),
}

impl AnalyzeArgs {
    fn source(&self) -> Source {
        if self.staged {
            return Source::Staged;
        }
        match (&self.baseline, &self.from, &self.to) {
            (Some(path), _, _) => Source::BaselineFile(path.clone()),
            (None, Some(from), Some(to)) => Source::Revisions {
                from: from.clone(),
                to: to.clone(),
            },
            _ => Source::Staged,
        }
    }
}

/// Executes the analysis and returns the rendered report.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `executor` - Runs git (use `ShellExecutor` for real execution).
pub fn execute<E: CommandExecutor>(args: &AnalyzeArgs, executor: E) -> CliResult<String> {
    let (baseline_text, working_text) = load_revisions(args, executor)?;

    let baseline = parse_revision(baseline_text)?;
    let working = parse_revision(working_text)?;

    let mut report = compare_documents(&baseline, &working);
    if !args.impact {
        report.impact.clear();
    }
    tracing::info!(
        file = %args.file.display(),
        changes = report.summary.total(),
        "analysis complete"
    );
    render(&report, args.format)
}

fn load_revisions<E: CommandExecutor>(
    args: &AnalyzeArgs,
    executor: E,
) -> CliResult<(Option<String>, Option<String>)> {
    let source = args.source();
    tracing::debug!(?source, "loading revisions");

    match source {
        Source::BaselineFile(baseline) => {
            let baseline = fs::read_to_string(baseline)?;
            let working = fs::read_to_string(&args.file)?;
            Ok((Some(baseline), Some(working)))
        }
        Source::Staged => {
            let repo = GitRepo::new(&args.repo, executor);
            let path = repo.relative_path(&args.file)?;
            if !repo.is_staged(&path)? {
                return Err(CliError::General(format!("'{path}' is not staged")));
            }
            Ok((repo.show_head(&path)?, repo.show_index(&path)?))
        }
        Source::Revisions { from, to } => {
            let repo = GitRepo::new(&args.repo, executor);
            let path = repo.relative_path(&args.file)?;
            Ok((
                repo.show_revision(&from, &path)?,
                repo.show_revision(&to, &path)?,
            ))
        }
    }
}

fn parse_revision(text: Option<String>) -> CliResult<DocumentModel> {
    match text {
        Some(text) => Ok(parse_document(&text)?),
        None => Ok(DocumentModel::default()),
    }
}
