#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use oasdelta_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Document parsing or analysis failure.
    #[display("{}", _0)]
    Core(AppError),

    /// A git invocation failed or returned something unusable.
    #[from(ignore)]
    #[display("Git Error: {}", _0)]
    Git(String),

    /// Report rendering failure.
    #[display("Render Error: {}", _0)]
    Render(serde_json::Error),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// Manual implementation of the standard Error trait.
///
/// `derive(Error)` is not used because `General(String)` and `Git(String)` carry
/// plain strings, which do not implement `std::error::Error`.
impl std::error::Error for CliError {}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::General(format!("YAML rendering failed: {err}"))
    }
}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
