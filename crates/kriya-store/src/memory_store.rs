//! In-memory object storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::ObjectStore;

/// In-memory object store backed by a `RwLock<HashMap>`.
///
/// Useful for testing and for nodes configured to run without persistence.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Bytes>>,
    metadata: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        debug!(key, size = data.len(), "storing object in memory");
        let mut map = self.objects.write().expect("lock poisoned");
        map.insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.objects.write().expect("lock poisoned");
        map.remove(key);
        self.metadata.write().expect("lock poisoned").remove(key);
        debug!(key, "deleted object from memory");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    async fn read_metadata(&self, key: &str, field: &str) -> Result<String, StoreError> {
        let map = self.metadata.read().expect("lock poisoned");
        Ok(map
            .get(key)
            .and_then(|fields| fields.get(field))
            .cloned()
            .unwrap_or_default())
    }

    async fn write_metadata(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut map = self.metadata.write().expect("lock poisoned");
        map.entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn object_count(&self) -> Result<usize, StoreError> {
        Ok(self.objects.read().expect("lock poisoned").len())
    }

    async fn list(&self, limit: usize) -> Result<Vec<(String, Bytes)>, StoreError> {
        let map = self.objects.read().expect("lock poisoned");
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        Ok(keys
            .into_iter()
            .take(limit)
            .map(|k| (k.clone(), map[k].clone()))
            .collect())
    }
}
