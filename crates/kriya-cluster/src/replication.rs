//! Replication coordinator: quorum-style write/delete fan-out.
//!
//! Every operation takes a registry snapshot (excluding self), attempts
//! the operation on each peer exactly once, retries the failing peers once
//! when the consensus threshold is unmet, and evicts peers that are still
//! failing after the retry. A quorum shortfall is reported as a degraded
//! outcome, never as an error — the local write already succeeded, so no
//! client-visible failure is raised from a replication shortfall alone.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use kriya_net::{NetError, PeerClient};
use kriya_types::{NodeAddr, ReplicationOutcome, ReplicationStatus};
use tracing::{debug, warn};

use crate::context::ClusterContext;

/// One peer operation, fanned out to the whole replica set.
#[derive(Clone, Copy)]
enum PeerOp<'a> {
    Put { key: &'a str, data: &'a Bytes },
    Delete { key: &'a str },
}

impl PeerOp<'_> {
    fn key(&self) -> &str {
        match self {
            PeerOp::Put { key, .. } | PeerOp::Delete { key } => key,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PeerOp::Put { .. } => "replicate",
            PeerOp::Delete { .. } => "delete",
        }
    }
}

/// Fans writes and deletes out to the replica set with a consensus
/// threshold, one retry round, and eviction of persistently failing peers.
pub struct ReplicationCoordinator {
    ctx: Arc<ClusterContext>,
    client: Arc<dyn PeerClient>,
}

impl ReplicationCoordinator {
    /// Create a coordinator over the given context and wire client.
    pub fn new(ctx: Arc<ClusterContext>, client: Arc<dyn PeerClient>) -> Self {
        Self { ctx, client }
    }

    /// Replicate a write to every peer.
    pub async fn replicate(&self, key: &str, data: &Bytes) -> ReplicationOutcome {
        self.fan_out(PeerOp::Put { key, data }).await
    }

    /// Replicate a delete to every peer.
    pub async fn delete(&self, key: &str) -> ReplicationOutcome {
        self.fan_out(PeerOp::Delete { key }).await
    }

    async fn fan_out(&self, op: PeerOp<'_>) -> ReplicationOutcome {
        let peers: Vec<NodeAddr> = self.ctx.peers().into_iter().map(|n| n.addr).collect();

        // Single-node cluster: any threshold is trivially satisfied.
        if peers.is_empty() {
            return ReplicationOutcome::trivial();
        }

        let config = self.ctx.config();
        // The redundancy factor weights the quorum denominator; each peer
        // still receives exactly one write attempt per round.
        let total_expected = peers.len() * config.redundancy_factor as usize;
        let required =
            (config.consensus_threshold * total_expected as f64).ceil() as usize;

        let mut succeeded = 0usize;
        let mut failed = self.attempt_round(op, &peers, &mut succeeded).await;

        if succeeded < required && !failed.is_empty() {
            debug!(
                op = op.name(),
                key = op.key(),
                succeeded,
                required,
                retrying = failed.len(),
                "threshold unmet, retrying failed peers once"
            );
            failed = self.attempt_round(op, &failed, &mut succeeded).await;
        }

        let status = if succeeded >= required {
            ReplicationStatus::Healthy
        } else {
            // Sole eviction trigger in the cluster. A peer that failed both
            // attempts of this operation counts once, not twice.
            for addr in &failed {
                self.ctx.evict_node(addr);
            }
            warn!(
                op = op.name(),
                key = op.key(),
                succeeded,
                required,
                evicted = failed.len(),
                "replication degraded, threshold unmet after retry"
            );
            ReplicationStatus::Degraded
        };

        ReplicationOutcome {
            attempted: peers.len(),
            succeeded,
            failed,
            status,
        }
    }

    /// Attempt `op` on each of `targets` concurrently. Increments
    /// `succeeded` per acknowledging peer and returns the failing ones.
    async fn attempt_round(
        &self,
        op: PeerOp<'_>,
        targets: &[NodeAddr],
        succeeded: &mut usize,
    ) -> Vec<NodeAddr> {
        let attempts = targets.iter().map(|addr| {
            let addr = addr.clone();
            async move {
                let result = self.apply(&addr, op).await;
                (addr, result)
            }
        });

        let mut failed = Vec::new();
        for (addr, result) in join_all(attempts).await {
            match result {
                Ok(()) => *succeeded += 1,
                Err(e) => {
                    debug!(%addr, key = op.key(), error = %e, "peer operation failed");
                    failed.push(addr);
                }
            }
        }
        failed
    }

    async fn apply(&self, addr: &NodeAddr, op: PeerOp<'_>) -> Result<(), NetError> {
        match op {
            PeerOp::Put { key, data } => {
                self.client.put_object(addr, key, data.clone()).await
            }
            PeerOp::Delete { key } => self.client.delete_object(addr, key).await,
        }
    }
}
