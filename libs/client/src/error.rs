//! Internal error types.
//!
//! Recoverable conditions never cross the public API as errors: callers see
//! `Option` / `bool` results and the subsystem keeps the prior good value.
//! These types exist for `?` propagation and log context inside the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading or writing the persisted space-graph cache.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot failed to decode: {0}")]
    Decode(#[from] serde_json::Error),
}
