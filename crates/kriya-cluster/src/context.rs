//! Shared cluster state: registry, configuration, and the event channel.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use kriya_types::{ClusterConfig, ClusterEvent, ConfigError, Node, NodeAddr};
use tokio::sync::broadcast;
use tracing::info;

use crate::error::ClusterError;
use crate::registry::Registry;

/// Shared, mutable cluster state.
///
/// One instance exists per cluster-participating process, constructed once
/// and passed by [`Arc`] to every component — there is no ambient global.
/// The registry holds *all* nodes including the local one; components that
/// need only peers use [`ClusterContext::peers`].
pub struct ClusterContext {
    local: NodeAddr,
    config: ClusterConfig,
    registry: Registry,
    events: broadcast::Sender<ClusterEvent>,
}

impl ClusterContext {
    /// Create the context after validating the configuration.
    pub fn new(local: NodeAddr, config: ClusterConfig) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let (events, _) = broadcast::channel(256);
        Ok(Arc::new(Self {
            local,
            config,
            registry: Registry::new(),
            events,
        }))
    }

    /// The local node's address.
    pub fn local(&self) -> &NodeAddr {
        &self.local
    }

    /// The cluster configuration (immutable for the cluster's lifetime).
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// The membership registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Subscribe to membership events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.events.subscribe()
    }

    /// Snapshot of every registered node, including the local one.
    pub fn nodes(&self) -> Vec<Node> {
        self.registry.list()
    }

    /// Snapshot of all nodes except the local one.
    pub fn peers(&self) -> Vec<Node> {
        self.registry
            .list()
            .into_iter()
            .filter(|n| n.addr != self.local)
            .collect()
    }

    /// Add a node to the registry and broadcast [`ClusterEvent::NodeJoined`].
    pub fn add_node(&self, node: Node) -> Result<(), ClusterError> {
        self.registry.add(node.clone())?;
        info!(addr = %node.addr, id = %node.id, "node joined cluster");
        let _ = self.events.send(ClusterEvent::NodeJoined(node));
        Ok(())
    }

    /// Remove a node (graceful departure). Returns whether it was present.
    pub fn remove_node(&self, addr: &NodeAddr) -> bool {
        let removed = self.registry.remove(addr);
        if removed {
            info!(%addr, "node left cluster");
            let _ = self.events.send(ClusterEvent::NodeLeft(addr.clone()));
        }
        removed
    }

    /// Evict a node after it failed replication operations persistently.
    ///
    /// This is the cluster's sole eviction trigger; heartbeat probe
    /// failures never call it.
    pub fn evict_node(&self, addr: &NodeAddr) {
        if self.registry.remove(addr) {
            info!(%addr, "node evicted after persistent replication failures");
            let _ = self.events.send(ClusterEvent::NodeEvicted(addr.clone()));
        }
    }
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
