//! Durable key-value storage
//!
//! The session ledger keeps its state under a handful of string keys. Stores
//! must apply a batch of writes all-or-nothing so that related keys never
//! disagree after a crash.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use crate::error::PersistenceError;

/// A single mutation inside an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: String, value: String },
    Delete { key: String },
}

impl WriteOp {
    pub fn put(key: &str, value: impl Into<String>) -> Self {
        Self::Put {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn delete(key: &str) -> Self {
        Self::Delete { key: key.to_string() }
    }
}

/// String key-value store with atomic batch writes
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Apply every operation in `batch`, or none of them
    fn apply(&self, batch: &[WriteOp]) -> Result<(), PersistenceError>;
}

pub(crate) fn apply_ops(
    entries: &mut std::collections::BTreeMap<String, String>,
    batch: &[WriteOp],
) {
    for op in batch {
        match op {
            WriteOp::Put { key, value } => {
                entries.insert(key.clone(), value.clone());
            }
            WriteOp::Delete { key } => {
                entries.remove(key);
            }
        }
    }
}
