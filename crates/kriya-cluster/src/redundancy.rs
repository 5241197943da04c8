//! Redundancy maintainer: opportunistic replica top-up sweep.
//!
//! For every locally stored object, counts the copies alive across the
//! cluster and pushes the object to peers that lack it until the
//! configured redundancy factor is met. Strictly additive: this task never
//! deletes anything and never triggers an eviction. Failures are logged
//! and retried on the next sweep.

use std::sync::Arc;

use kriya_net::PeerClient;
use kriya_store::ObjectStore;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::context::ClusterContext;
use crate::error::ClusterError;
use crate::handle::TaskHandle;

/// Restores missing replicas of locally held objects.
pub struct RedundancyMaintainer {
    ctx: Arc<ClusterContext>,
    store: Arc<dyn ObjectStore>,
    client: Arc<dyn PeerClient>,
}

impl RedundancyMaintainer {
    /// Create a maintainer over the local store and wire client.
    pub fn new(
        ctx: Arc<ClusterContext>,
        store: Arc<dyn ObjectStore>,
        client: Arc<dyn PeerClient>,
    ) -> Self {
        Self { ctx, store, client }
    }

    /// Run one sweep over every local object. Returns the number of
    /// replicas pushed.
    pub async fn sweep(&self) -> Result<usize, ClusterError> {
        let peers = self.ctx.peers();
        if peers.is_empty() {
            return Ok(0);
        }

        let target = self.ctx.config().redundancy_factor as usize;
        let objects = self.store.list(usize::MAX).await?;
        let mut pushed = 0usize;

        for (key, data) in objects {
            // The local copy always counts as one.
            let mut copies = 1usize;
            let mut lacking = Vec::new();

            for peer in &peers {
                match self.client.object_exists(&peer.addr, &key).await {
                    Ok(true) => copies += 1,
                    Ok(false) => lacking.push(peer.addr.clone()),
                    Err(e) => {
                        // Unknown state; leave this peer out of the sweep.
                        warn!(addr = %peer.addr, key, error = %e, "replica check failed");
                    }
                }
            }

            if copies >= target {
                continue;
            }

            debug!(key, copies, target, "object below redundancy target");
            for addr in lacking {
                if copies >= target {
                    break;
                }
                match self.client.put_object(&addr, &key, data.clone()).await {
                    Ok(()) => {
                        info!(key, %addr, "restored missing replica");
                        copies += 1;
                        pushed += 1;
                    }
                    Err(e) => {
                        warn!(key, %addr, error = %e, "replica push failed");
                    }
                }
            }
        }

        Ok(pushed)
    }

    /// Spawn the sweep loop as a background task. The first sweep runs one
    /// full interval after startup.
    pub fn spawn(self) -> TaskHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.ctx.config().rebalance_interval;

        let task = tokio::spawn(async move {
            info!("redundancy maintainer started");
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.sweep().await {
                            Ok(0) => debug!("redundancy sweep: all objects at target"),
                            Ok(pushed) => info!(pushed, "redundancy sweep restored replicas"),
                            Err(e) => warn!(error = %e, "redundancy sweep failed"),
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("redundancy maintainer shutting down");
                        break;
                    }
                }
            }
        });

        TaskHandle::new(shutdown_tx, task)
    }
}
