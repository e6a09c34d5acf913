//! Error types for the maze Q-learning crate

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("direction must be up, down, left or right, got '{input}'")]
    InvalidDirection { input: String },

    #[error("action id {action} does not map to a movement")]
    InvalidAction { action: usize },

    #[error("call limit of {limit} turns reached during training")]
    CallLimitExceeded { limit: u64 },

    #[error("'{key}' is not a valid item in the configuration")]
    UnknownConfigKey { key: String },

    #[error("no configuration found for agent '{name}'")]
    MissingAgentConfig { name: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid maze: {message}")]
    InvalidMaze { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid progress bar template: {message}")]
    ProgressBarTemplate { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}
