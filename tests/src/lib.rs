//! Shared test harness for Kriya integration tests.
//!
//! Provides [`IntegrationCluster`] — an N-node cluster wired over an
//! in-process loopback wire instead of HTTP, exercising the full
//! coordination pipeline: local write → replication fan-out → heartbeat
//! bookkeeping → rebalance moves → redundancy sweeps.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use kriya_cluster::{
    ClusterContext, Rebalancer, RedundancyMaintainer, ReplicationCoordinator,
};
use kriya_net::{NetError, NodeStats, PeerClient};
use kriya_store::{MemoryStore, ObjectStore};
use kriya_types::{ClusterConfig, Node, NodeAddr, ReplicationOutcome};

/// One in-process node: its store and its view of the cluster.
struct NodeState {
    addr: NodeAddr,
    store: Arc<MemoryStore>,
    ctx: Arc<ClusterContext>,
}

/// Loopback wire routing peer operations directly to the target node's
/// store. Nodes in `down` are unreachable, which is how tests inject
/// failures.
struct LoopbackWire {
    nodes: RwLock<Vec<Arc<NodeState>>>,
    down: RwLock<HashSet<NodeAddr>>,
}

impl LoopbackWire {
    fn target(&self, addr: &NodeAddr) -> Result<Arc<NodeState>, NetError> {
        if self.down.read().expect("lock poisoned").contains(addr) {
            return Err(NetError::Unreachable {
                addr: addr.clone(),
                reason: "node is down".into(),
            });
        }
        self.nodes
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|n| &n.addr == addr)
            .cloned()
            .ok_or_else(|| NetError::Unreachable {
                addr: addr.clone(),
                reason: "unknown node".into(),
            })
    }
}

#[async_trait]
impl PeerClient for LoopbackWire {
    async fn probe(&self, addr: &NodeAddr) -> Result<NodeStats, NetError> {
        self.fetch_stats(addr).await
    }

    async fn put_object(
        &self,
        addr: &NodeAddr,
        key: &str,
        data: Bytes,
    ) -> Result<(), NetError> {
        let node = self.target(addr)?;
        node.store
            .write(key, data)
            .await
            .map_err(|e| NetError::Body {
                addr: addr.clone(),
                reason: e.to_string(),
            })
    }

    async fn delete_object(&self, addr: &NodeAddr, key: &str) -> Result<(), NetError> {
        let node = self.target(addr)?;
        node.store.delete(key).await.map_err(|e| NetError::Body {
            addr: addr.clone(),
            reason: e.to_string(),
        })
    }

    async fn object_exists(&self, addr: &NodeAddr, key: &str) -> Result<bool, NetError> {
        let node = self.target(addr)?;
        node.store.exists(key).await.map_err(|e| NetError::Body {
            addr: addr.clone(),
            reason: e.to_string(),
        })
    }

    async fn fetch_stats(&self, addr: &NodeAddr) -> Result<NodeStats, NetError> {
        let node = self.target(addr)?;
        let object_count = node
            .store
            .object_count()
            .await
            .map_err(|e| NetError::Body {
                addr: addr.clone(),
                reason: e.to_string(),
            })? as u64;
        Ok(NodeStats { object_count })
    }

    async fn list_objects(
        &self,
        addr: &NodeAddr,
        limit: usize,
    ) -> Result<Vec<(String, Bytes)>, NetError> {
        let node = self.target(addr)?;
        node.store.list(limit).await.map_err(|e| NetError::Body {
            addr: addr.clone(),
            reason: e.to_string(),
        })
    }

    async fn join(&self, seed: &NodeAddr, local: &NodeAddr) -> Result<Vec<Node>, NetError> {
        let node = self.target(seed)?;
        // Idempotent, same as the HTTP join endpoint.
        let _ = node.ctx.add_node(Node::new(local.clone()));
        Ok(node.ctx.nodes())
    }

    async fn leave(&self, peer: &NodeAddr, local: &NodeAddr) -> Result<(), NetError> {
        let node = self.target(peer)?;
        node.ctx.remove_node(local);
        Ok(())
    }
}

/// An N-node in-process cluster with full mutual membership.
pub struct IntegrationCluster {
    nodes: Vec<Arc<NodeState>>,
    wire: Arc<LoopbackWire>,
}

impl IntegrationCluster {
    /// Build a cluster of `n` nodes where every node already knows every
    /// other node.
    pub fn new(n: usize, config: ClusterConfig) -> Self {
        let addrs: Vec<NodeAddr> = (0..n).map(|i| Self::addr(i)).collect();
        let mut nodes = Vec::with_capacity(n);
        for addr in &addrs {
            let ctx = ClusterContext::new(addr.clone(), config.clone())
                .expect("valid test config");
            for member in &addrs {
                ctx.add_node(Node::new(member.clone())).expect("unique addr");
            }
            nodes.push(Arc::new(NodeState {
                addr: addr.clone(),
                store: Arc::new(MemoryStore::new()),
                ctx,
            }));
        }

        let wire = Arc::new(LoopbackWire {
            nodes: RwLock::new(nodes.clone()),
            down: RwLock::new(HashSet::new()),
        });
        Self { nodes, wire }
    }

    /// Build `n` nodes that know only themselves; membership must be
    /// formed through [`PeerClient::join`] calls.
    pub fn new_unjoined(n: usize, config: ClusterConfig) -> Self {
        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let addr = Self::addr(i);
            let ctx = ClusterContext::new(addr.clone(), config.clone())
                .expect("valid test config");
            ctx.add_node(Node::new(addr.clone())).expect("unique addr");
            nodes.push(Arc::new(NodeState {
                addr,
                store: Arc::new(MemoryStore::new()),
                ctx,
            }));
        }

        let wire = Arc::new(LoopbackWire {
            nodes: RwLock::new(nodes.clone()),
            down: RwLock::new(HashSet::new()),
        });
        Self { nodes, wire }
    }

    fn addr(i: usize) -> NodeAddr {
        NodeAddr::new(format!("node-{i}"), 4920)
    }

    /// Address of node `i`.
    pub fn node_addr(&self, i: usize) -> NodeAddr {
        self.nodes[i].addr.clone()
    }

    /// Node `i`'s cluster context.
    pub fn ctx(&self, i: usize) -> Arc<ClusterContext> {
        self.nodes[i].ctx.clone()
    }

    /// Node `i`'s local store.
    pub fn store(&self, i: usize) -> Arc<MemoryStore> {
        self.nodes[i].store.clone()
    }

    /// The shared wire, for driving joins directly.
    pub fn wire(&self) -> Arc<dyn PeerClient> {
        self.wire.clone()
    }

    /// Replication coordinator running on node `i`.
    pub fn replication(&self, i: usize) -> ReplicationCoordinator {
        ReplicationCoordinator::new(self.nodes[i].ctx.clone(), self.wire.clone())
    }

    /// Rebalancer running on node `i`.
    pub fn rebalancer(&self, i: usize) -> Rebalancer {
        Rebalancer::new(self.nodes[i].ctx.clone(), self.wire.clone())
    }

    /// Redundancy maintainer running on node `i`.
    pub fn redundancy(&self, i: usize) -> RedundancyMaintainer {
        RedundancyMaintainer::new(
            self.nodes[i].ctx.clone(),
            self.nodes[i].store.clone(),
            self.wire.clone(),
        )
    }

    /// Write an object through node `i`'s full client path: local store,
    /// then fan-out.
    pub async fn put(&self, i: usize, key: &str, data: &[u8]) -> ReplicationOutcome {
        let data = Bytes::copy_from_slice(data);
        self.nodes[i]
            .store
            .write(key, data.clone())
            .await
            .expect("local write");
        self.replication(i).replicate(key, &data).await
    }

    /// Make node `i` unreachable.
    pub fn take_down(&self, i: usize) {
        self.wire
            .down
            .write()
            .expect("lock poisoned")
            .insert(self.nodes[i].addr.clone());
    }

    /// Bring node `i` back.
    pub fn bring_up(&self, i: usize) {
        self.wire
            .down
            .write()
            .expect("lock poisoned")
            .remove(&self.nodes[i].addr);
    }
}

/// Deterministic payload of `len` bytes.
pub fn test_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
