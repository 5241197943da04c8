//! Error types for object storage operations.

/// Errors that can occur during object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(String),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A metadata sidecar could not be decoded.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// A sealed object could not be sealed or unsealed.
    #[error("sealing error: {0}")]
    Sealed(String),
}
