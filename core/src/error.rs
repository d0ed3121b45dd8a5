//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// The input text is not well-formed YAML/JSON.
    #[display("Parse Error: {_0}")]
    Parse(serde_yaml::Error),

    /// Well-formed input that lacks the document shape we need (e.g. `paths`).
    #[from(ignore)]
    #[display("Schema Error: {_0}")]
    Schema(String),

    /// A reference token with no matching named schema.
    #[from(ignore)]
    #[display("Unresolved reference: {_0}")]
    UnresolvedReference(String),

    /// A reference chain that revisits one of its own tokens.
    #[from(ignore)]
    #[display("Cyclic reference: {}", chain.join(" -> "))]
    CyclicReference {
        /// Tokens on the path, ending with the revisited one.
        chain: Vec<String>,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_json::Value>("a: [1, 2").unwrap_err();
        let app_err: AppError = yaml_err.into();
        assert!(matches!(app_err, AppError::Parse(_)));
        assert!(app_err.to_string().starts_with("Parse Error:"));
    }

    #[test]
    fn test_string_conversion() {
        // String defaults to General, never to Schema
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_cycle_display() {
        let app_err = AppError::CyclicReference {
            chain: vec![
                "#/components/schemas/A".into(),
                "#/components/schemas/B".into(),
                "#/components/schemas/A".into(),
            ],
        };
        assert_eq!(
            app_err.to_string(),
            "Cyclic reference: #/components/schemas/A -> #/components/schemas/B -> #/components/schemas/A"
        );
    }
}
