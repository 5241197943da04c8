//! Cluster coordination for Kriya.
//!
//! This crate provides:
//!
//! - [`Registry`] — the authoritative in-memory membership list.
//! - [`ClusterContext`] — shared state (registry + config + event channel)
//!   constructed once and passed by handle to every component.
//! - [`HeartbeatMonitor`] — periodic liveness probing of all peers.
//! - [`ReplicationCoordinator`] — quorum-style write/delete fan-out with
//!   one retry and eviction of persistently failing peers.
//! - [`Rebalancer`] — periodic flattening of per-node object counts.
//! - [`RedundancyMaintainer`] — opportunistic replica top-up sweep.

mod context;
mod error;
mod handle;
mod heartbeat;
mod rebalance;
mod redundancy;
mod registry;
mod replication;


pub use context::ClusterContext;
pub use error::ClusterError;
pub use handle::TaskHandle;
pub use heartbeat::HeartbeatMonitor;
pub use rebalance::{MoveReport, Rebalancer};
pub use redundancy::RedundancyMaintainer;
pub use registry::Registry;
pub use replication::ReplicationCoordinator;
