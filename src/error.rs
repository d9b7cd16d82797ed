#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),

    #[error("project '{0}' already exists")]
    DuplicateProject(String),

    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    #[error("to-do '{id}' not found in project '{project}'")]
    TaskNotFound { project: String, id: String },

    #[error("no to-do matches '{0}'")]
    NoMatchingTask(String),

    #[error("stored data under '{key}' could not be decoded")]
    CorruptSnapshot {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode snapshot")]
    Encode(#[source] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },

    #[error("io error at {path}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TodoError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound(_) | Self::TaskNotFound { .. } | Self::NoMatchingTask(_)
        )
    }
}
