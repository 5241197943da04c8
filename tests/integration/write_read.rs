//! Integration test: replicated write and read-back.

use kriya_integration_tests::{test_data, IntegrationCluster};
use kriya_store::ObjectStore;
use kriya_types::ClusterConfig;

/// A write entering node 0 lands on every node, byte-identical.
#[tokio::test]
async fn test_write_replicates_to_all_nodes() {
    let c = IntegrationCluster::new(3, ClusterConfig::default());
    let data = test_data(5000);

    let outcome = c.put(0, "backups/archive.tar", &data).await;
    assert!(outcome.is_healthy());
    assert_eq!(outcome.succeeded, 2);

    for i in 0..3 {
        let got = c.store(i).read("backups/archive.tar").await.unwrap();
        assert_eq!(&got[..], &data[..], "node {i} should hold the object");
    }
}

/// A delete entering node 1 removes the object everywhere.
#[tokio::test]
async fn test_delete_removes_object_from_all_nodes() {
    let c = IntegrationCluster::new(3, ClusterConfig::default());
    c.put(1, "ephemeral.log", b"transient").await;

    let outcome = c.replication(1).delete("ephemeral.log").await;
    assert!(outcome.is_healthy());
    c.store(1).delete("ephemeral.log").await.unwrap();

    for i in 0..3 {
        assert!(!c.store(i).exists("ephemeral.log").await.unwrap());
    }
}

/// Writes entering different nodes coexist.
#[tokio::test]
async fn test_writes_from_multiple_entry_points() {
    let c = IntegrationCluster::new(3, ClusterConfig::default());

    for i in 0..3 {
        let key = format!("from-node-{i}.bin");
        let outcome = c.put(i, &key, &test_data(100 + i)).await;
        assert!(outcome.is_healthy());
    }

    for i in 0..3 {
        assert_eq!(c.store(i).object_count().await.unwrap(), 3);
    }
}
