//! Error types shared across the timer core, storage and device bridge

use std::{io, path::PathBuf};

/// A requested interval length was rejected. The prior configuration is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

/// The durable store could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),

    /// A store backend that is neither file nor JSON based reported a failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// The device link is missing, unreachable or spoke something we don't understand.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("no device link configured")]
    NotConfigured,

    #[error("device {path} unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed device line: {0:?}")]
    Malformed(String),
}
