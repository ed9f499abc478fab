//! File-backed store
//!
//! All keys live in a single JSON object (`store.json`) inside the data
//! directory. Every batch rewrites the whole document into a temporary file in
//! the same directory and renames it over the old one, so readers after a crash
//! see either the previous document or the new one, never a mix.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{apply_ops, KeyValueStore, WriteOp};
use crate::error::PersistenceError;

const STORE_FILE: &str = "store.json";

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or create) the store in `dir`.
    ///
    /// A document that cannot be parsed is moved aside to `store.json.corrupt`
    /// and the store starts empty.
    pub fn open(dir: &Path) -> Result<Self, PersistenceError> {
        fs::create_dir_all(dir).map_err(|source| PersistenceError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(STORE_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    let aside = path.with_extension("json.corrupt");
                    warn!(
                        "Store {} is not valid JSON ({}), moving it to {}",
                        path.display(),
                        e,
                        aside.display()
                    );
                    if let Err(e) = fs::rename(&path, &aside) {
                        warn!("Failed to move corrupt store aside: {}", e);
                    }
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PersistenceError::Read { path, source }),
        };

        debug!("Opened store {} with {} keys", path.display(), entries.len());

        Ok(Self {
            dir: dir.to_path_buf(),
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, entries: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        let content = serde_json::to_vec_pretty(entries)?;
        let write_err = |source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(&content).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn apply(&self, batch: &[WriteOp]) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = entries.clone();
        apply_ops(&mut next, batch);
        self.write_document(&next)?;

        *entries = next;
        Ok(())
    }
}
