//! Storage port for the signup core.
//!
//! Progress, version history and resume tokens are persisted as JSON strings
//! under three well-known keys. Any backend offering `get/set/remove` over
//! string keys can host them: [`memory::MemoryStorage`] for tests and
//! single-process hosts, [`json_file::JsonFileStorage`] for a durable local
//! file. [`json_map_store::JsonMapStore`] is the async typed map used by the
//! mail outbox.

pub mod json_file;
pub mod json_map_store;
pub mod memory;

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::StorageError;

pub const PROGRESS_KEY: &str = "leidy.signup.v1";
pub const VERSIONS_KEY: &str = "leidy.signup.v1.versions";
pub const RESUME_TOKENS_KEY: &str = "leidy.resume.tokens";

/// Synchronous key-value backend.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Resolved key names, optionally prefixed with `<namespace>:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub progress: String,
    pub versions: String,
    pub resume_tokens: String,
}

impl StorageKeys {
    pub fn new(namespace: Option<&str>) -> Self {
        let ns = namespace.map(str::trim).filter(|ns| !ns.is_empty());
        let key = |base: &str| match ns {
            Some(ns) => format!("{ns}:{base}"),
            None => base.to_string(),
        };
        Self {
            progress: key(PROGRESS_KEY),
            versions: key(VERSIONS_KEY),
            resume_tokens: key(RESUME_TOKENS_KEY),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self { Self::new(None) }
}

/// Read and decode a JSON value. Missing key is `Ok(None)`; undecodable JSON is `Corrupt`.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt { key: key.to_string(), reason: e.to_string() }),
    }
}

pub fn write_json<T: Serialize>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Encode(e.to_string()))?;
    storage.set(key, &raw)
}
