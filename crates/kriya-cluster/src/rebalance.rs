//! Rebalancer: periodic flattening of per-node object counts.
//!
//! One pass per tick, restricted to the single max-count and min-count
//! pair; full equilibrium is reached over multiple ticks rather than in
//! one. Every moved object is written to the destination and confirmed
//! before the source copy is deleted — never the reverse order, so a move
//! can duplicate an object transiently but never drop it.

use std::sync::Arc;

use kriya_net::PeerClient;
use kriya_types::NodeAddr;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::context::ClusterContext;
use crate::error::ClusterError;
use crate::handle::TaskHandle;

/// Result of a completed rebalance move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    /// The over-loaded node objects were taken from.
    pub from: NodeAddr,
    /// The under-loaded node objects were moved to.
    pub to: NodeAddr,
    /// Number of objects actually moved.
    pub moved: usize,
}

/// Moves objects from the most-loaded node to the least-loaded one when
/// the spread exceeds the mean.
pub struct Rebalancer {
    ctx: Arc<ClusterContext>,
    client: Arc<dyn PeerClient>,
}

impl Rebalancer {
    /// Create a rebalancer over the given context and wire client.
    pub fn new(ctx: Arc<ClusterContext>, client: Arc<dyn PeerClient>) -> Self {
        Self { ctx, client }
    }

    /// Run one rebalance pass. Returns `None` when no move was warranted.
    ///
    /// Nodes whose count query fails are excluded from this pass and
    /// reconsidered on the next tick.
    pub async fn run_once(&self) -> Result<Option<MoveReport>, ClusterError> {
        let nodes = self.ctx.nodes();
        if nodes.len() < 2 {
            return Ok(None);
        }

        // Registry iteration order decides ties for max and min.
        let mut counts: Vec<(NodeAddr, u64)> = Vec::with_capacity(nodes.len());
        for node in &nodes {
            match self.client.fetch_stats(&node.addr).await {
                Ok(stats) => counts.push((node.addr.clone(), stats.object_count)),
                Err(e) => {
                    warn!(addr = %node.addr, error = %e, "skipping node in rebalance pass");
                }
            }
        }
        if counts.len() < 2 {
            return Ok(None);
        }

        let total: u64 = counts.iter().map(|(_, c)| c).sum();
        let mean = total as f64 / counts.len() as f64;

        let (mut max_idx, mut min_idx) = (0usize, 0usize);
        for (i, (_, count)) in counts.iter().enumerate() {
            if *count > counts[max_idx].1 {
                max_idx = i;
            }
            if *count < counts[min_idx].1 {
                min_idx = i;
            }
        }

        let (source, max_count) = counts[max_idx].clone();
        let (dest, min_count) = counts[min_idx].clone();
        let diff = max_count - min_count;

        if diff as f64 <= mean {
            debug!(max_count, min_count, mean, "load spread within tolerance");
            return Ok(None);
        }

        let to_move = (diff / 2) as usize;
        info!(
            from = %source, to = %dest, to_move, max_count, min_count,
            "rebalancing objects"
        );

        let objects = self
            .client
            .list_objects(&source, to_move)
            .await
            .map_err(|e| ClusterError::SourceUnavailable {
                addr: source.clone(),
                source: e,
            })?;

        let mut moved = 0usize;
        for (key, data) in objects {
            // Destination write must be confirmed before the source copy
            // goes away; a failed delete leaves a harmless extra copy.
            if let Err(e) = self.client.put_object(&dest, &key, data).await {
                warn!(key, to = %dest, error = %e, "move write failed, deferring to next tick");
                break;
            }
            if let Err(e) = self.client.delete_object(&source, &key).await {
                warn!(key, from = %source, error = %e, "source cleanup failed after move");
            }
            moved += 1;
        }

        Ok(Some(MoveReport {
            from: source,
            to: dest,
            moved,
        }))
    }

    /// Spawn the rebalance loop as a background task. The first pass runs
    /// one full interval after startup.
    pub fn spawn(self) -> TaskHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.ctx.config().rebalance_interval;

        let task = tokio::spawn(async move {
            info!("rebalancer started");
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.run_once().await {
                            Ok(Some(report)) => info!(
                                from = %report.from,
                                to = %report.to,
                                moved = report.moved,
                                "rebalance pass moved objects"
                            ),
                            Ok(None) => debug!("rebalance pass: nothing to do"),
                            Err(e) => warn!(error = %e, "rebalance pass failed"),
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("rebalancer shutting down");
                        break;
                    }
                }
            }
        });

        TaskHandle::new(shutdown_tx, task)
    }
}
