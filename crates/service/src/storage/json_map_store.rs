use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};

use crate::errors::StorageError;

/// Async JSON-file-backed typed map.
///
/// Persists a `HashMap<K, V>` to a JSON file on every mutation. Used for the
/// mail outbox, where records are appended by the relay and drained by an
/// external delivery process.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StorageError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                key: file_path.display().to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                let data = serde_json::to_vec(&empty).map_err(|e| StorageError::Encode(e.to_string()))?;
                fs::write(&file_path, data).await.map_err(|e| StorageError::Io(e.to_string()))?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    async fn save(&self, map: &HashMap<K, V>) -> Result<(), StorageError> {
        let data = serde_json::to_vec(map).map_err(|e| StorageError::Encode(e.to_string()))?;
        fs::write(&self.file_path, data).await.map_err(|e| StorageError::Io(e.to_string()))
    }

    pub async fn len(&self) -> usize { self.inner.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.inner.read().await.is_empty() }

    /// All values, in no particular order.
    pub async fn values(&self) -> Vec<V> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or replace a value and persist. The write lock is held across the
    /// file write so concurrent inserts cannot persist out of order.
    pub async fn insert(&self, key: K, value: V) -> Result<(), StorageError> {
        let mut map = self.inner.write().await;
        map.insert(key, value);
        self.save(&map).await
    }

    /// Remove a key and persist; returns whether it existed.
    pub async fn remove(&self, key: &K) -> Result<bool, StorageError> {
        let mut map = self.inner.write().await;
        let existed = map.remove(key).is_some();
        if existed {
            self.save(&map).await?;
        }
        Ok(existed)
    }

    /// Take every value out of the store, leaving it empty on disk.
    pub async fn drain(&self) -> Result<Vec<V>, StorageError> {
        let mut map = self.inner.write().await;
        let taken: Vec<V> = map.drain().map(|(_, v)| v).collect();
        self.save(&map).await?;
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_map_store_persists_and_drains() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("outbox.json");
        let store = JsonMapStore::<String, u32>::new(&path).await?;
        assert!(store.is_empty().await);

        store.insert("a".into(), 1).await?;
        store.insert("b".into(), 2).await?;
        assert!(store.remove(&"a".to_string()).await?);
        assert!(!store.remove(&"missing".to_string()).await?);

        let reloaded = JsonMapStore::<String, u32>::new(&path).await?;
        assert_eq!(reloaded.get(&"b".to_string()).await, Some(2));
        assert_eq!(reloaded.len().await, 1);

        let drained = reloaded.drain().await?;
        assert_eq!(drained, vec![2]);
        assert!(JsonMapStore::<String, u32>::new(&path).await?.is_empty().await);
        Ok(())
    }
}
