//! Error types for peer network operations.

use kriya_types::NodeAddr;

/// Errors that can occur when talking to a peer node.
///
/// A [`NetError::Timeout`] is treated identically to
/// [`NetError::Unreachable`] everywhere: both count as eviction evidence
/// and trigger the replication retry.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// The peer call exceeded its bounded timeout.
    #[error("peer {addr} timed out")]
    Timeout {
        /// The peer that failed to respond in time.
        addr: NodeAddr,
    },

    /// Connection to the peer failed.
    #[error("peer {addr} unreachable: {reason}")]
    Unreachable {
        /// The peer that could not be reached.
        addr: NodeAddr,
        /// Underlying transport error.
        reason: String,
    },

    /// The peer responded with an unexpected HTTP status.
    #[error("peer {addr} returned status {status}")]
    Status {
        /// The peer that answered.
        addr: NodeAddr,
        /// The unexpected status code.
        status: u16,
    },

    /// The peer's response body could not be decoded.
    #[error("bad response from peer {addr}: {reason}")]
    Body {
        /// The peer that answered.
        addr: NodeAddr,
        /// What went wrong while decoding.
        reason: String,
    },
}

impl NetError {
    /// Classify a transport error from the HTTP client.
    pub(crate) fn from_request(addr: &NodeAddr, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetError::Timeout { addr: addr.clone() }
        } else {
            NetError::Unreachable {
                addr: addr.clone(),
                reason: err.to_string(),
            }
        }
    }
}
