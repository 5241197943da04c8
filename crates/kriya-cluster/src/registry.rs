//! Membership registry: the authoritative in-memory node list.

use std::sync::RwLock;

use kriya_types::{Node, NodeAddr};

use crate::error::ClusterError;

/// Authoritative list of cluster nodes, keyed by address.
///
/// Mutations are mutually exclusive via the inner lock; reads return owned
/// snapshots, so concurrent mutation during iteration is never observed
/// mid-operation. Insertion order is preserved — tie-breaking in the
/// rebalancer relies on it.
#[derive(Default)]
pub struct Registry {
    nodes: RwLock<Vec<Node>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Fails with [`ClusterError::DuplicateNode`] when a node
    /// with the same address is already present, leaving the registry
    /// unchanged.
    pub fn add(&self, node: Node) -> Result<(), ClusterError> {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        if nodes.iter().any(|n| n.addr == node.addr) {
            return Err(ClusterError::DuplicateNode(node.addr));
        }
        nodes.push(node);
        Ok(())
    }

    /// Remove a node by address. No-op when absent; returns whether a node
    /// was actually removed.
    pub fn remove(&self, addr: &NodeAddr) -> bool {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        let before = nodes.len();
        nodes.retain(|n| &n.addr != addr);
        nodes.len() != before
    }

    /// Snapshot of all nodes in insertion order (a copy, not a live view).
    pub fn list(&self) -> Vec<Node> {
        self.nodes.read().expect("lock poisoned").clone()
    }

    /// Look up a node by address.
    pub fn get(&self, addr: &NodeAddr) -> Option<Node> {
        self.nodes
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|n| &n.addr == addr)
            .cloned()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a successful heartbeat probe: update the node's
    /// `last_heartbeat` and its advertised object count. No-op when the
    /// node has been removed in the meantime.
    pub fn touch(&self, addr: &NodeAddr, now: u64, object_count: u64) {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        if let Some(node) = nodes.iter_mut().find(|n| &n.addr == addr) {
            node.last_heartbeat = now;
            node.object_count = object_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(host: &str) -> Node {
        Node::new(NodeAddr::new(host, 4920))
    }

    #[test]
    fn test_add_and_list() {
        let registry = Registry::new();
        registry.add(node("a")).unwrap();
        registry.add(node("b")).unwrap();

        let listed = registry.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].addr.host, "a");
        assert_eq!(listed[1].addr.host, "b");
    }

    #[test]
    fn test_duplicate_add_fails_and_leaves_count_unchanged() {
        let registry = Registry::new();
        registry.add(node("a")).unwrap();

        let err = registry.add(node("a")).unwrap_err();
        assert!(matches!(err, ClusterError::DuplicateNode(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let registry = Registry::new();
        registry.add(node("a")).unwrap();

        assert!(!registry.remove(&NodeAddr::new("ghost", 4920)));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&NodeAddr::new("a", 4920)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let registry = Registry::new();
        registry.add(node("a")).unwrap();

        let snapshot = registry.list();
        registry.remove(&NodeAddr::new("a", 4920));
        // The earlier snapshot is unaffected by the removal.
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_touch_updates_bookkeeping() {
        let registry = Registry::new();
        let n = node("a");
        let addr = n.addr.clone();
        registry.add(n).unwrap();

        registry.touch(&addr, 1_700_000_000, 42);
        let updated = registry.get(&addr).unwrap();
        assert_eq!(updated.last_heartbeat, 1_700_000_000);
        assert_eq!(updated.object_count, 42);

        // Touching a removed node is a no-op.
        registry.remove(&addr);
        registry.touch(&addr, 1, 1);
        assert!(registry.get(&addr).is_none());
    }
}
