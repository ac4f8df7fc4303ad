use std::path::PathBuf;
use thiserror::Error;

use crate::bundler::GraphError;
use crate::vfs::VfsError;

/// Core error type for uigen operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl Error {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Vfs(e) => e.code(),
            Self::Graph(e) => e.code(),
            Self::ConfigRead { .. } => "CONFIG_READ_ERROR",
            Self::ConfigParse { .. } => "CONFIG_PARSE_ERROR",
            Self::InvalidConfig { .. } => "CONFIG_INVALID",
            Self::Json(_) => "JSON_ERROR",
            Self::Logging(_) => "LOGGING_INIT_ERROR",
        }
    }
}

/// Result alias for uigen operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
