//! Local store error types.

use std::io;
use std::path::PathBuf;

use crate::models::MigrationError;

/// Errors that can occur while reading or writing the local store.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Key is empty or would escape the data directory.
    InvalidKey(String),
    /// Stored value is not valid JSON.
    DecodeError(serde_json::Error),
    /// Stored record could not be migrated to the current schema.
    MigrationError(MigrationError),
    /// Trips could not be serialized.
    EncodeError(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(path, e) => write!(f, "I/O error for {}: {}", path.display(), e),
            StoreError::InvalidKey(key) => write!(f, "Invalid store key: {:?}", key),
            StoreError::DecodeError(e) => write!(f, "Stored trips are not valid JSON: {}", e),
            StoreError::MigrationError(e) => write!(f, "Failed to migrate stored trip: {}", e),
            StoreError::EncodeError(e) => write!(f, "Failed to serialize trips: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::IoError(_, e) => Some(e),
            StoreError::DecodeError(e) | StoreError::EncodeError(e) => Some(e),
            StoreError::MigrationError(e) => Some(e),
            StoreError::InvalidKey(_) => None,
        }
    }
}
