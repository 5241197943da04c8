//! Credential verification for client mutations.

use subtle::ConstantTimeEq;

/// Verifies the `x-access-key` / `x-secret-key` pair on client mutations.
///
/// A trait so tests (and future external identity providers) can swap the
/// implementation without touching the handlers.
pub trait Identity: Send + Sync {
    /// Whether the presented credential pair is valid.
    fn verify(&self, access_key: &str, secret_key: &str) -> bool;
}

/// Identity backed by a single configured key pair.
pub struct StaticIdentity {
    access_key: String,
    secret_key: String,
}

impl StaticIdentity {
    /// Create a verifier for the given key pair.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl Identity for StaticIdentity {
    fn verify(&self, access_key: &str, secret_key: &str) -> bool {
        // Constant-time on both halves to prevent timing probes, and no
        // early exit on the access key.
        let access_ok: bool = self
            .access_key
            .as_bytes()
            .ct_eq(access_key.as_bytes())
            .into();
        let secret_ok: bool = self
            .secret_key
            .as_bytes()
            .ct_eq(secret_key.as_bytes())
            .into();
        access_ok & secret_ok
    }
}
