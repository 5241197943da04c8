//! Heartbeat monitor: periodic liveness probing of all peers.
//!
//! On each tick every peer is probed concurrently — one slow or dead node
//! never delays probing of the others, which bounds tick latency to a
//! single probe timeout.
//!
//! Probe failures are logged but **never** mutate membership: eviction is
//! exclusively the replication coordinator's failure-counting path, so the
//! two policies cannot race.

use std::sync::Arc;

use futures::future::join_all;
use kriya_net::PeerClient;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::context::{unix_now, ClusterContext};
use crate::handle::TaskHandle;

/// Probes every peer once per `heartbeat_interval` tick.
pub struct HeartbeatMonitor {
    ctx: Arc<ClusterContext>,
    client: Arc<dyn PeerClient>,
}

impl HeartbeatMonitor {
    /// Create a monitor over the given context and wire client.
    pub fn new(ctx: Arc<ClusterContext>, client: Arc<dyn PeerClient>) -> Self {
        Self { ctx, client }
    }

    /// Probe all peers once, concurrently.
    ///
    /// Successful probes update the peer's `last_heartbeat` and advertised
    /// object count; failed probes leave the registry untouched.
    pub async fn tick(&self) {
        let peers = self.ctx.peers();
        if peers.is_empty() {
            return;
        }

        let probes = peers.iter().map(|peer| {
            let client = self.client.clone();
            let addr = peer.addr.clone();
            async move {
                let result = client.probe(&addr).await;
                (addr, result)
            }
        });

        let now = unix_now();
        for (addr, result) in join_all(probes).await {
            match result {
                Ok(stats) => {
                    debug!(%addr, object_count = stats.object_count, "peer heartbeat ok");
                    self.ctx.registry().touch(&addr, now, stats.object_count);
                }
                Err(e) => {
                    // No retry; the next tick supersedes this one.
                    warn!(%addr, error = %e, "peer probe failed");
                }
            }
        }
    }

    /// Spawn the probe loop as a background task.
    pub fn spawn(self) -> TaskHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval = self.ctx.config().heartbeat_interval;

        let task = tokio::spawn(async move {
            info!("heartbeat monitor started");
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.tick().await,
                    _ = shutdown_rx.changed() => {
                        info!("heartbeat monitor shutting down");
                        break;
                    }
                }
            }
        });

        TaskHandle::new(shutdown_tx, task)
    }
}
