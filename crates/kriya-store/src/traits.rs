//! Core trait for object storage.

use bytes::Bytes;

use crate::error::StoreError;

/// Trait for storing and retrieving objects with a metadata side-channel.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Data is passed as [`Bytes`] to enable zero-copy handoff to the
/// replication path.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object by key. Fails with [`StoreError::NotFound`] if absent.
    async fn read(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Store an object under the given key, replacing any previous value.
    async fn write(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Delete an object by key. Idempotent: deleting an absent key is `Ok`.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Read a metadata field for an object. Returns `""` when the field
    /// (or the object's metadata) is absent.
    async fn read_metadata(&self, key: &str, field: &str) -> Result<String, StoreError>;

    /// Write a metadata field for an object.
    async fn write_metadata(&self, key: &str, field: &str, value: &str)
        -> Result<(), StoreError>;

    /// Number of objects currently stored.
    async fn object_count(&self) -> Result<usize, StoreError>;

    /// List up to `limit` objects as `(key, data)` pairs, in stable key
    /// order. Used by the rebalancer's move operations.
    async fn list(&self, limit: usize) -> Result<Vec<(String, Bytes)>, StoreError>;
}
