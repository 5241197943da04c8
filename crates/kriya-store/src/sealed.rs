//! At-rest sealing for object payloads.
//!
//! [`SealedStore`] wraps another backend and seals every object before
//! it lands there: the payload is gzip-compressed, then encrypted with
//! AES-256-GCM under a random per-object key. The key is hex-encoded
//! into the object's metadata side-channel, so a sealed object travels
//! with everything needed to unseal it. Reads reverse the pipeline and
//! fail with [`StoreError::Sealed`] on tampered or truncated data.
//!
//! Listings are returned as plaintext: they feed rebalance moves and
//! redundancy pushes, which land on the destination node's own sealing
//! write path and get a fresh key there.

use std::io::{Read, Write};
use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use rand::RngCore;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::ObjectStore;

/// Metadata field holding an object's hex-encoded sealing key.
const ENCRYPTION_KEY_FIELD: &str = "encryption_key";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Backend decorator that compresses and encrypts objects at rest.
pub struct SealedStore {
    inner: Arc<dyn ObjectStore>,
}

impl SealedStore {
    /// Wrap a backend so that everything written through this store is
    /// sealed before it reaches the backend.
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self { inner }
    }

    /// Compress then encrypt. Layout of the sealed bytes: nonce || ciphertext.
    fn seal(data: &[u8], object_key: &[u8; KEY_LEN]) -> Result<Vec<u8>, StoreError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(object_key));
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), compressed.as_slice())
            .map_err(|_| StoreError::Sealed("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt then decompress.
    fn unseal(sealed: &[u8], object_key: &[u8; KEY_LEN]) -> Result<Bytes, StoreError> {
        if sealed.len() < NONCE_LEN {
            return Err(StoreError::Sealed("sealed object truncated".to_string()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(object_key));
        let compressed = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                StoreError::Sealed("decryption failed, object tampered or corrupted".to_string())
            })?;

        let mut plain = Vec::new();
        GzDecoder::new(compressed.as_slice()).read_to_end(&mut plain)?;
        Ok(Bytes::from(plain))
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex_key(hex: &str) -> Option<[u8; KEY_LEN]> {
    if hex.len() != KEY_LEN * 2 {
        return None;
    }
    let mut out = [0u8; KEY_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok()?;
    }
    Some(out)
}

#[async_trait::async_trait]
impl ObjectStore for SealedStore {
    async fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        let sealed = self.inner.read(key).await?;
        let field = self.inner.read_metadata(key, ENCRYPTION_KEY_FIELD).await?;
        // An empty field means the object predates sealing; serve as-is.
        if field.is_empty() {
            return Ok(sealed);
        }
        let object_key = decode_hex_key(&field)
            .ok_or_else(|| StoreError::Sealed(format!("bad sealing key for object {key}")))?;
        Self::unseal(&sealed, &object_key)
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let mut object_key = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut object_key);
        let sealed = Self::seal(&data, &object_key)?;
        debug!(key, plain = data.len(), sealed = sealed.len(), "sealing object");
        self.inner.write(key, Bytes::from(sealed)).await?;
        self.inner
            .write_metadata(key, ENCRYPTION_KEY_FIELD, &encode_hex(&object_key))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }

    async fn read_metadata(&self, key: &str, field: &str) -> Result<String, StoreError> {
        self.inner.read_metadata(key, field).await
    }

    async fn write_metadata(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.inner.write_metadata(key, field, value).await
    }

    async fn object_count(&self) -> Result<usize, StoreError> {
        self.inner.object_count().await
    }

    async fn list(&self, limit: usize) -> Result<Vec<(String, Bytes)>, StoreError> {
        let sealed = self.inner.list(limit).await?;
        let mut out = Vec::with_capacity(sealed.len());
        for (key, _) in sealed {
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
