//! Integration test: node failure, eviction, and recovery.

use kriya_cluster::HeartbeatMonitor;
use kriya_integration_tests::{test_data, IntegrationCluster};
use kriya_store::ObjectStore;
use kriya_types::{ClusterConfig, ReplicationStatus};

/// A dead peer degrades the write, is evicted, and later writes are
/// healthy against the shrunken cluster.
#[tokio::test]
async fn test_dead_node_is_evicted_then_cluster_recovers() {
    let c = IntegrationCluster::new(3, ClusterConfig::default());
    c.take_down(2);

    // 2 peers × factor 2 × threshold 0.5 = 2 required; only 1 reachable.
    let outcome = c.put(0, "during-outage.txt", &test_data(64)).await;
    assert_eq!(outcome.status, ReplicationStatus::Degraded);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, vec![c.node_addr(2)]);

    // Node 0 dropped the dead peer; the others still list it.
    assert_eq!(c.ctx(0).registry().len(), 2);
    assert_eq!(c.ctx(1).registry().len(), 3);

    // With one remaining peer, 1 of 2 expected acks suffices.
    let outcome = c.put(0, "after-eviction.txt", &test_data(64)).await;
    assert!(outcome.is_healthy());
    assert!(c.store(1).exists("after-eviction.txt").await.unwrap());
}

/// Failed heartbeat probes alone never shrink the membership; once the
/// node is back, writes are healthy with no eviction having happened.
#[tokio::test]
async fn test_probe_failures_never_evict() {
    let c = IntegrationCluster::new(2, ClusterConfig::default());
    let monitor = HeartbeatMonitor::new(c.ctx(0), c.wire());
    c.take_down(1);

    for _ in 0..5 {
        monitor.tick().await;
    }
    assert_eq!(c.ctx(0).registry().len(), 2);

    c.bring_up(1);
    let outcome = c.put(0, "steady.txt", &test_data(32)).await;
    assert!(outcome.is_healthy());
    assert_eq!(c.ctx(0).registry().len(), 2);
}

/// The redundancy sweep restores copies lost to a failed node once a
/// replacement peer is reachable.
#[tokio::test]
async fn test_redundancy_sweep_restores_lost_copies() {
    let c = IntegrationCluster::new(3, ClusterConfig::default());
    let data = test_data(256);
    c.put(0, "precious.db", &data).await;

    // Node 2 loses its copy (disk wipe, replacement host).
    c.store(2).delete("precious.db").await.unwrap();

    // Factor is 2 and two copies survive, so the sweep is a no-op.
    assert_eq!(c.redundancy(0).sweep().await.unwrap(), 0);

    // Node 1 also loses its copy; now the sweep must push one replica.
    c.store(1).delete("precious.db").await.unwrap();
    assert_eq!(c.redundancy(0).sweep().await.unwrap(), 1);

    let copies = (0..3)
        .map(|i| c.store(i))
        .collect::<Vec<_>>();
    let mut held = 0;
    for store in copies {
        if store.exists("precious.db").await.unwrap() {
            held += 1;
        }
    }
    assert_eq!(held, 2);
}
