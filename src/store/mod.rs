//! Key-value persistence for sitelog data.
//!
//! The whole job collection is serialized as one JSON document under one
//! fixed key. Stores have a finite capacity and reject writes over it with
//! `Error::StoreFull`; callers treat that as a non-fatal warning, never a
//! crash.
//!
//! Two implementations are provided:
//! - `FileStore` - one file per key under the data directory (default)
//! - `MemStore` - in-memory map, used by tests to simulate quota errors

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::{Error, Result};

/// The fixed key holding the serialized job collection.
pub const JOBS_KEY: &str = "jobs";

/// Default store capacity, approximating the quota of the storage this
/// tool's data typically lives under.
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Trait for key-value stores that persist string documents.
pub trait Store {
    /// Read the value under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any prior value.
    ///
    /// Returns `Error::StoreFull` when the value exceeds the store's
    /// capacity; the prior value is left intact in that case.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove the value under `key`, if any.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;
}

/// File-backed store: `<root>/<key>.json`, whole-file overwrites.
pub struct FileStore {
    root: PathBuf,
    max_bytes: usize,
}

impl FileStore {
    /// Create a store rooted at `root` with an optional capacity override.
    pub fn new(root: PathBuf, max_bytes: Option<usize>) -> Self {
        Self {
            root,
            max_bytes: max_bytes.unwrap_or(DEFAULT_MAX_BYTES),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if value.len() > self.max_bytes {
            return Err(Error::StoreFull(format!(
                "{} bytes exceeds the {} byte capacity",
                value.len(),
                self.max_bytes
            )));
        }

        fs::create_dir_all(&self.root)?;

        // Write-then-rename so a crash mid-write never truncates the
        // previous document.
        let path = self.key_path(key);
        let tmp = self.root.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory store with the same capacity behavior as `FileStore`.
pub struct MemStore {
    values: HashMap<String, String>,
    max_bytes: Option<usize>,
}

impl MemStore {
    /// Create a store with an optional byte capacity per value.
    pub fn new(max_bytes: Option<usize>) -> Self {
        Self {
            values: HashMap::new(),
            max_bytes,
        }
    }
}

impl Store for MemStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(max) = self.max_bytes {
            if value.len() > max {
                return Err(Error::StoreFull(format!(
                    "{} bytes exceeds the {} byte capacity",
                    value.len(),
                    max
                )));
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// The default data directory: `<XDG data dir>/sitelog`.
///
/// Callers resolve overrides first (the `--data-dir` flag, `SLG_DATA_DIR`,
/// then the config file) and fall back to this.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|d| d.join("sitelog"))
        .ok_or_else(|| Error::Other("could not determine data directory".to_string()))
}
