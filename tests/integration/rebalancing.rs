//! Integration test: load rebalancing across nodes.

use bytes::Bytes;
use kriya_integration_tests::{test_data, IntegrationCluster};
use kriya_store::ObjectStore;
use kriya_types::ClusterConfig;

/// Seed node `i`'s store with `count` objects, bypassing replication.
async fn seed(c: &IntegrationCluster, i: usize, count: usize) {
    let store = c.store(i);
    for n in 0..count {
        let key = format!("node{i}/obj-{n:04}");
        store
            .write(&key, Bytes::from(test_data(64)))
            .await
            .unwrap();
    }
}

/// A lopsided two-node cluster is levelled in one pass: half the spread
/// moves off the heavy node.
#[tokio::test]
async fn test_one_pass_levels_two_nodes() {
    let c = IntegrationCluster::new(2, ClusterConfig::default());
    seed(&c, 0, 5).await;
    seed(&c, 1, 35).await;

    let report = c.rebalancer(0).run_once().await.unwrap().unwrap();
    assert_eq!(report.from, c.node_addr(1));
    assert_eq!(report.to, c.node_addr(0));
    assert_eq!(report.moved, 15);

    assert_eq!(c.store(0).object_count().await.unwrap(), 20);
    assert_eq!(c.store(1).object_count().await.unwrap(), 20);
}

/// A tolerable spread is left alone.
#[tokio::test]
async fn test_balanced_cluster_is_untouched() {
    let c = IntegrationCluster::new(2, ClusterConfig::default());
    seed(&c, 0, 10).await;
    seed(&c, 1, 20).await;

    assert!(c.rebalancer(0).run_once().await.unwrap().is_none());
    assert_eq!(c.store(0).object_count().await.unwrap(), 10);
    assert_eq!(c.store(1).object_count().await.unwrap(), 20);
}

/// Repeated passes drive a three-node cluster to a stable state where no
/// further move is warranted.
#[tokio::test]
async fn test_repeated_passes_reach_equilibrium() {
    let c = IntegrationCluster::new(3, ClusterConfig::default());
    seed(&c, 0, 90).await;

    let rebalancer = c.rebalancer(0);
    let mut passes = 0;
    while rebalancer.run_once().await.unwrap().is_some() {
        passes += 1;
        assert!(passes < 20, "rebalancing should converge");
    }

    // Conservation: nothing lost, nothing duplicated.
    let mut total = 0;
    for i in 0..3 {
        let count = c.store(i).object_count().await.unwrap();
        assert!(count > 0, "node {i} should have received objects");
        total += count;
    }
    assert_eq!(total, 90);

    // The final spread is within the no-move tolerance.
    let counts: Vec<usize> = {
        let mut v = Vec::new();
        for i in 0..3 {
            v.push(c.store(i).object_count().await.unwrap());
        }
        v
    };
    let max = *counts.iter().max().unwrap();
    let min = *counts.iter().min().unwrap();
    let mean = total as f64 / 3.0;
    assert!((max - min) as f64 <= mean);
}

/// Objects moved by the rebalancer survive byte-identically.
#[tokio::test]
async fn test_moved_objects_are_intact() {
    let c = IntegrationCluster::new(2, ClusterConfig::default());
    let data = test_data(512);
    for n in 0..30 {
        c.store(1)
            .write(&format!("obj-{n:04}"), Bytes::from(data.clone()))
            .await
            .unwrap();
    }

    c.rebalancer(0).run_once().await.unwrap().unwrap();

    // Every object lives on exactly one node with its original bytes.
    for n in 0..30 {
        let key = format!("obj-{n:04}");
        let on0 = c.store(0).exists(&key).await.unwrap();
        let on1 = c.store(1).exists(&key).await.unwrap();
        assert!(on0 ^ on1, "{key} should live on exactly one node");
        let store = if on0 { c.store(0) } else { c.store(1) };
        assert_eq!(&store.read(&key).await.unwrap()[..], &data[..]);
    }
}
