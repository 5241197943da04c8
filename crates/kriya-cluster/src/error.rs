//! Error types for cluster coordination.

use kriya_net::NetError;
use kriya_store::StoreError;
use kriya_types::NodeAddr;

/// Errors produced by the cluster coordination layer.
///
/// Quorum shortfall is deliberately *not* here: it is reported as a
/// degraded [`kriya_types::ReplicationOutcome`], never raised as an error.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// An `add` was attempted for an address already in the registry.
    #[error("node with address {0} already registered")]
    DuplicateNode(NodeAddr),

    /// A peer network call failed (timeout or connection failure).
    #[error("network error: {0}")]
    Net(#[from] NetError),

    /// The local store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A rebalance move was aborted because the source node could not be
    /// listed; objects are left in place and retried on the next tick.
    #[error("rebalance source {addr} unavailable")]
    SourceUnavailable {
        /// The source node of the aborted move.
        addr: NodeAddr,
        /// The underlying network failure.
        #[source]
        source: NetError,
    },
}
