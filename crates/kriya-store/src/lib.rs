//! Object storage trait and backend implementations.
//!
//! This crate defines the [`ObjectStore`] trait consumed by the cluster
//! core, along with two concrete backends:
//!
//! - [`MemoryStore`] — in-memory storage backed by a `RwLock<HashMap>`.
//! - [`FileStore`] — one file per object with a JSON metadata sidecar.
//!
//! [`SealedStore`] decorates either backend with gzip compression and
//! AES-256-GCM encryption at rest.

mod error;
mod file_store;
mod memory_store;
mod sealed;
mod traits;

pub use error::StoreError;
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use sealed::SealedStore;
pub use traits::ObjectStore;
