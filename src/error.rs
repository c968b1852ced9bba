//! Error taxonomy for a history parse.
//!
//! Ownership mismatches are not errors: they are skipped with a warning by
//! the merge stage. Everything here aborts the whole parse.

use std::path::PathBuf;

use crate::id::IdParseError;

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Bad caller input, reported before the file is opened.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to read history file {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record failed to decode, or an identifier failed to parse.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// No record for the requested DAG, or an entity whose parent is missing.
    #[error("incomplete history log: {0}")]
    IncompleteLog(String),
}

impl HistoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

impl From<IdParseError> for HistoryError {
    fn from(err: IdParseError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}
