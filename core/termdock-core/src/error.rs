//! Error types for termdock-core operations.
//!
//! Only validation and path-resolution failures surface as errors; storage
//! I/O problems are absorbed inside the store and logged.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TermdockError {
    #[error("Cannot determine home directory")]
    HomeDirUnavailable,

    #[error("Failed to create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read hook input: {0}")]
    InputRead(#[source] std::io::Error),

    #[error("Hook input is not valid JSON: {0}")]
    InputMalformed(#[source] serde_json::Error),

    #[error("Hook input is missing a session_id")]
    MissingSessionId,

    #[error("Unrecognized hook event name: {0}")]
    UnknownEvent(String),
}
