//! Error handling for the Parley CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Parley error: {0}")]
    Parley(#[from] parley_core::ParleyError),

    #[error("Codec error: {0}")]
    Codec(#[from] parley_core::CodecError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script line {line}: {reason}")]
    Script { line: usize, reason: String },

    #[error("No account configured for {0}")]
    UnknownAccount(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    pub fn script(line: usize, reason: impl Into<String>) -> Self {
        Self::Script {
            line,
            reason: reason.into(),
        }
    }
}
