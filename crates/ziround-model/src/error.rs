use std::path::PathBuf;

use thiserror::Error;
use ziround_core::ProblemError;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),
    #[error("Unsupported model format: {0} (expected .mps or .json)")]
    UnsupportedFormat(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

impl ModelError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        ModelError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.into(),
            source,
        }
    }
}
