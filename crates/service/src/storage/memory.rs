use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dashmap::DashMap;

use super::KeyValueStorage;
use crate::errors::StorageError;

/// In-process storage. Can be switched off or given a byte quota to mimic a
/// disabled or full browser store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
    disabled: AtomicBool,
    // 0 = unlimited
    quota_bytes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_quota(bytes: usize) -> Self {
        let s = Self::default();
        s.quota_bytes.store(bytes, Ordering::SeqCst);
        s
    }

    pub fn set_available(&self, available: bool) {
        self.disabled.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    fn check(&self) -> Result<(), StorageError> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        Ok(())
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.key() != key)
            .map(|e| e.key().len() + e.value().len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        let quota = self.quota_bytes.load(Ordering::SeqCst);
        if quota > 0 && self.used_bytes_without(key) + key.len() + value.len() > quota {
            return Err(StorageError::QuotaExceeded(key.to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crud_and_disable() {
        let s = MemoryStorage::new();
        s.set("a", "1").unwrap();
        assert_eq!(s.get("a").unwrap().as_deref(), Some("1"));
        s.remove("a").unwrap();
        assert!(s.get("a").unwrap().is_none());

        s.set_available(false);
        assert!(matches!(s.get("a"), Err(StorageError::Unavailable(_))));
        s.set_available(true);
        assert!(s.get("a").is_ok());
    }

    #[test]
    fn quota_counts_replacement_once() {
        let s = MemoryStorage::with_quota(10);
        s.set("k", "12345").unwrap();
        // replacing the same key does not double count
        s.set("k", "123456789").unwrap();
        assert!(matches!(s.set("other", "xxxxxx"), Err(StorageError::QuotaExceeded(_))));
    }
}
