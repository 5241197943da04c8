//! File-based object storage backend.
//!
//! Stores one file per object. Object keys are arbitrary strings, so the
//! on-disk filename is the lowercase hex encoding of the key bytes; a
//! `<name>.meta` JSON sidecar holds the metadata fields.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::ObjectStore;

const META_EXT: &str = "meta";
const TMP_EXT: &str = "tmp";

/// File-backed object store.
///
/// Writes are atomic: data is written to a temporary file first, then
/// renamed into place, so a crash never leaves a half-written object.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at the given directory, creating it if
    /// it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(encode_key(key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{META_EXT}", encode_key(key)))
    }

    async fn read_meta_map(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        // Appended, not substituted: the object file and its sidecar must
        // not share a temp path.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".");
        tmp.push(TMP_EXT);
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Encode an object key into a filesystem-safe filename (lowercase hex).
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() * 2);
    for byte in key.as_bytes() {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Decode a hex filename back into the object key. Returns `None` for
/// filenames that are not valid encodings (sidecars, temp files).
fn decode_key(name: &str) -> Option<String> {
    if name.len() % 2 != 0 || name.is_empty() {
        return None;
    }
    let mut bytes = Vec::with_capacity(name.len() / 2);
    for i in (0..name.len()).step_by(2) {
        bytes.push(u8::from_str_radix(name.get(i..i + 2)?, 16).ok()?);
    }
    String::from_utf8(bytes).ok()
}

#[async_trait::async_trait]
impl ObjectStore for FileStore {
    async fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        match tokio::fs::read(self.object_path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.object_path(key);
        self.write_atomic(&path, &data).await?;
        debug!(key, path = %path.display(), size = data.len(), "stored object to file");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        for path in [self.object_path(key), self.meta_path(key)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
        debug!(key, "deleted object file");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match tokio::fs::metadata(self.object_path(key)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn read_metadata(&self, key: &str, field: &str) -> Result<String, StoreError> {
        let map = self.read_meta_map(key).await?;
        Ok(map.get(field).cloned().unwrap_or_default())
    }

    async fn write_metadata(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut map = self.read_meta_map(key).await?;
        map.insert(field.to_string(), value.to_string());
        let raw = serde_json::to_vec(&map)?;
        self.write_atomic(&self.meta_path(key), &raw).await
    }

    async fn object_count(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if decode_key(name).is_some() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    async fn list(&self, limit: usize) -> Result<Vec<(String, Bytes)>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Some(key) = decode_key(name) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        keys.truncate(limit);

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            // An object deleted between the listing and the read is skipped.
            match self.read(&key).await {
                Ok(data) => out.push((key, data)),
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}
