use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong across ingest, solving and persistence.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("malformed formula: {0}")]
    MalformedFormula(String),

    #[error("brute-force scope exceeded: {num_variables} variables exceeds the limit of {limit}")]
    ScopeExceeded { num_variables: usize, limit: usize },

    #[error("failed to read store file {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write store file {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to deserialize store state from {path}: {source}")]
    StoreDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize store state: {0}")]
    StoreEncode(#[source] serde_json::Error),

    #[error("failed to write run log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
