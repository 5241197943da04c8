//! Shared types and identifiers for Kriya.
//!
//! This crate defines the core types used across the Kriya workspace:
//! node identity ([`NodeId`], [`NodeAddr`], [`Node`]), cluster configuration
//! ([`ClusterConfig`]), replication results ([`ReplicationOutcome`],
//! [`ReplicationStatus`]), and cluster events ([`ClusterEvent`]).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata field under which an object's CRC32 checksum is stored.
pub const META_CHECKSUM: &str = "checksum";
/// Metadata field under which an object's size in bytes is stored.
pub const META_SIZE: &str = "size";

// ---------------------------------------------------------------------------
// Node identity
// ---------------------------------------------------------------------------

/// Cluster-assigned surrogate identifier for a node.
///
/// Identity for membership purposes is the node's [`NodeAddr`]; the id only
/// disambiguates restarts of the same address in logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh random id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Network address of a cluster node. This is the node's identity for
/// membership purposes: the registry never holds two nodes with the same
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddr {
    /// Host name or IP address.
    pub host: String,
    /// TCP port of the node's HTTP endpoint.
    pub port: u16,
}

impl NodeAddr {
    /// Create an address from host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Error parsing a `host:port` string into a [`NodeAddr`].
#[derive(Debug, thiserror::Error)]
#[error("invalid node address {input:?}: expected host:port")]
pub struct AddrParseError {
    /// The string that failed to parse.
    pub input: String,
}

impl FromStr for NodeAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| AddrParseError {
            input: s.to_string(),
        })?;
        let port = port.parse().map_err(|_| AddrParseError {
            input: s.to_string(),
        })?;
        if host.is_empty() {
            return Err(AddrParseError {
                input: s.to_string(),
            });
        }
        Ok(Self::new(host, port))
    }
}

/// A member of the cluster as tracked by the membership registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Surrogate identifier assigned when the node joined.
    pub id: NodeId,
    /// The node's address (membership identity).
    pub addr: NodeAddr,
    /// Unix timestamp (seconds) of the last successful heartbeat probe.
    pub last_heartbeat: u64,
    /// Number of objects the node reported holding at its last probe.
    pub object_count: u64,
}

impl Node {
    /// Create a node record with a fresh id and zeroed bookkeeping fields.
    pub fn new(addr: NodeAddr) -> Self {
        Self {
            id: NodeId::new(),
            addr,
            last_heartbeat: 0,
            object_count: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Cluster-wide configuration, immutable after construction.
///
/// Reconfiguration at runtime is out of scope: the threshold and redundancy
/// factor are fixed for the cluster's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Interval between heartbeat probe rounds.
    pub heartbeat_interval: Duration,
    /// Interval between rebalance passes.
    pub rebalance_interval: Duration,
    /// Minimum fraction of expected replica writes that must succeed for a
    /// replication operation to be considered healthy. In `(0, 1]`.
    pub consensus_threshold: f64,
    /// Target number of copies of each object across the cluster. At least 1.
    pub redundancy_factor: u32,
    /// Timeout applied to every peer network call.
    pub probe_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            rebalance_interval: Duration::from_secs(60),
            consensus_threshold: 0.5,
            redundancy_factor: 2,
            probe_timeout: Duration::from_secs(3),
        }
    }
}

/// Error produced when a [`ClusterConfig`] fails validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The consensus threshold is outside `(0, 1]`.
    #[error("consensus_threshold must be in (0, 1], got {0}")]
    Threshold(f64),
    /// The redundancy factor is zero.
    #[error("redundancy_factor must be at least 1")]
    Redundancy,
}

impl ClusterConfig {
    /// Validate the invariants the rest of the system assumes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.consensus_threshold > 0.0 && self.consensus_threshold <= 1.0) {
            return Err(ConfigError::Threshold(self.consensus_threshold));
        }
        if self.redundancy_factor < 1 {
            return Err(ConfigError::Redundancy);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Replication outcome
// ---------------------------------------------------------------------------

/// Health of a completed replication operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationStatus {
    /// The consensus threshold was met (possibly after the single retry).
    Healthy,
    /// The threshold was not met even after the retry; still-failing peers
    /// were evicted. Never surfaced to the client as an error.
    Degraded,
}

/// Transient per-call result of a replication fan-out. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationOutcome {
    /// Number of peers the operation was attempted on.
    pub attempted: usize,
    /// Number of peers that acknowledged the operation.
    pub succeeded: usize,
    /// Peers still failing after the retry round.
    pub failed: Vec<NodeAddr>,
    /// Whether the consensus threshold was met.
    pub status: ReplicationStatus,
}

impl ReplicationOutcome {
    /// Outcome for a fan-out with no peers: trivially healthy.
    pub fn trivial() -> Self {
        Self {
            attempted: 0,
            succeeded: 0,
            failed: Vec::new(),
            status: ReplicationStatus::Healthy,
        }
    }

    /// Whether the threshold was met.
    pub fn is_healthy(&self) -> bool {
        self.status == ReplicationStatus::Healthy
    }
}

// ---------------------------------------------------------------------------
// Cluster events
// ---------------------------------------------------------------------------

/// Membership changes broadcast on the cluster context's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterEvent {
    /// A node was added to the registry (explicit add or self-registration).
    NodeJoined(Node),
    /// A node was removed through an explicit departure.
    NodeLeft(NodeAddr),
    /// A node was removed by the replication coordinator's failure path.
    NodeEvicted(NodeAddr),
}
