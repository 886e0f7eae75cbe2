use std::{collections::HashMap, fs, path::PathBuf, sync::RwLock};

use tracing::warn;

use super::KeyValueStorage;
use crate::errors::StorageError;

/// Durable local storage: the whole key space lives in one JSON object on disk
/// and is rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileStorage {
    inner: RwLock<HashMap<String, String>>,
    file_path: PathBuf,
}

impl JsonFileStorage {
    /// Open the file, creating it (and parent dirs) with an empty object when missing.
    /// An unreadable or corrupt file starts empty and is overwritten on the next write.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }

        let map: HashMap<String, String> = match fs::read(&file_path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "corrupt storage file, starting empty");
                HashMap::new()
            }),
            Err(_) => {
                let empty: HashMap<String, String> = HashMap::new();
                let data = serde_json::to_vec(&empty).map_err(|e| StorageError::Encode(e.to_string()))?;
                fs::write(&file_path, data).map_err(|e| StorageError::Io(e.to_string()))?;
                empty
            }
        };

        Ok(Self { inner: RwLock::new(map), file_path })
    }

    pub fn path(&self) -> &std::path::Path { &self.file_path }

    fn save(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let data = serde_json::to_vec(map).map_err(|e| StorageError::Encode(e.to_string()))?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.file_path).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }
}

fn poisoned() -> StorageError { StorageError::Unavailable("storage lock poisoned".into()) }

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let previous = map.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save(&map) {
            // keep memory consistent with disk
            match previous {
                Some(p) => map.insert(key.to_string(), p),
                None => map.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let Some(previous) = map.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.save(&map) {
            map.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state/signup.json");
        let store = JsonFileStorage::open(&path)?;

        // initially empty
        assert!(store.get("a")?.is_none());

        store.set("a", "1")?;
        store.set("b", "{\"step\":2}")?;
        store.remove("a")?;

        let reopened = JsonFileStorage::open(&path)?;
        assert!(reopened.get("a")?.is_none());
        assert_eq!(reopened.get("b")?.as_deref(), Some("{\"step\":2}"));
        Ok(())
    }

    #[test]
    fn corrupt_file_starts_empty() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("signup.json");
        fs::write(&path, b"][")?;
        let store = JsonFileStorage::open(&path)?;
        assert!(store.get("anything")?.is_none());
        store.set("k", "v")?;
        assert_eq!(JsonFileStorage::open(&path)?.get("k")?.as_deref(), Some("v"));
        Ok(())
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("signup.json");
        let store = JsonFileStorage::open(&path)?;
        store.set("a", "1")?;

        // a directory in the way of the temp file makes every save fail
        fs::create_dir(path.with_extension("json.tmp"))?;
        assert!(matches!(store.remove("a"), Err(StorageError::Io(_))));
        assert_eq!(store.get("a")?.as_deref(), Some("1"));
        assert!(matches!(store.set("a", "2"), Err(StorageError::Io(_))));
        assert!(matches!(store.set("b", "2"), Err(StorageError::Io(_))));
        assert_eq!(store.get("a")?.as_deref(), Some("1"));
        assert!(store.get("b")?.is_none());
        Ok(())
    }

    #[test]
    fn unusable_parent_is_an_io_error() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x")?;
        let res = JsonFileStorage::open(blocker.join("state/signup.json"));
        assert!(matches!(res, Err(StorageError::Io(_))));
        Ok(())
    }
}
