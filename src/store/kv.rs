//! Persistent key-value stores holding serialized text values.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use super::error::StoreError;

/// A persistent string-to-string store.
pub trait KeyValueStore {
    /// Returns the value for `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites the value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<data_dir>/<key>.json`.
///
/// Writes go to a temp file that is renamed over the old value, so a failed
/// write leaves the previous value in place.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    data_dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the file backing `key`.
    pub fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        Self::validate_key(key)?;
        Ok(self.data_dir.join(format!("{}.json", key)))
    }

    fn validate_key(key: &str) -> Result<(), StoreError> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.starts_with('.')
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path(key)?;

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::IoError(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path(key)?;

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::IoError(self.data_dir.clone(), e))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file =
            File::create(&temp_path).map_err(|e| StoreError::IoError(temp_path.clone(), e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| StoreError::IoError(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| StoreError::IoError(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| StoreError::IoError(path, e))?;

        Ok(())
    }
}

/// In-process store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
