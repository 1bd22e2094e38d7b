//! CLI error types

use multisig_runtime::ConfigError;
use multisig_types::MultisigError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scenario parse error: {0}")]
    Scenario(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] MultisigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
