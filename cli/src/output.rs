//! Report rendering.

use crate::error::CliResult;
use serde::Serialize;

/// Format of reports written to stdout.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// Renders `value` in `format`, always ending with a newline.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> CliResult<String> {
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}
