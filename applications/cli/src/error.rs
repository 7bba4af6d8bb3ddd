/// CLI error types
use thiserror::Error;
use walkup_core::WalkupError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid roster: {0}")]
    Roster(String),

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error(transparent)]
    Walkup(#[from] WalkupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Roster parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<::config::ConfigError> for CliError {
    fn from(err: ::config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
