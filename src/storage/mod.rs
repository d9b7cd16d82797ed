#![forbid(unsafe_code)]

//! Flat key-value persistence. A backend stores one opaque string per key and
//! overwrites it atomically.

pub mod snapshot;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TodoError;

pub use snapshot::{STORAGE_KEY, Snapshot};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, TodoError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), TodoError>;
    fn remove(&mut self, key: &str) -> Result<(), TodoError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, TodoError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TodoError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TodoError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), TodoError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| TodoError::IoPath {
            path: self.dir.clone(),
            source,
        })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, TodoError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, TodoError> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .map_err(|source| TodoError::IoPath { path, source })?;
        Ok(Some(data))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TodoError> {
        self.ensure_dir()?;
        let path = self.key_path(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value.as_bytes()).map_err(|source| TodoError::IoPath {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| TodoError::IoPath {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = value.len(), "wrote store entry");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TodoError> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TodoError::IoPath { path, source }),
        }
    }
}

pub fn validate_key(key: &str) -> Result<(), TodoError> {
    if key.trim().is_empty() {
        return Err(TodoError::validation("storage key is required"));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(TodoError::validation(format!(
            "invalid storage key '{key}': must not contain path separators"
        )));
    }
    if key.contains("..") {
        return Err(TodoError::validation(format!(
            "invalid storage key '{key}': must not contain '..'"
        )));
    }
    Ok(())
}
