//! Integration test: cluster formation through seed joins.

use kriya_integration_tests::IntegrationCluster;
use kriya_net::PeerClient;
use kriya_types::ClusterConfig;

/// Nodes 1..4 announce to node 0 and adopt its membership view.
#[tokio::test]
async fn test_join_via_seed_builds_full_membership() {
    let c = IntegrationCluster::new_unjoined(5, ClusterConfig::default());
    let seed = c.node_addr(0);

    for i in 1..5 {
        let members = c.wire().join(&seed, &c.node_addr(i)).await.unwrap();
        // The seed's view includes itself plus everyone who joined so far.
        assert_eq!(members.len(), i + 1);
        for member in members {
            if member.addr != c.node_addr(i) {
                let _ = c.ctx(i).add_node(member);
            }
        }
    }

    // The seed knows everyone.
    assert_eq!(c.ctx(0).registry().len(), 5);
    // The last joiner adopted the complete view.
    assert_eq!(c.ctx(4).registry().len(), 5);
}

/// A retried join is answered with the membership view, not an error.
#[tokio::test]
async fn test_rejoin_is_idempotent() {
    let c = IntegrationCluster::new_unjoined(2, ClusterConfig::default());
    let seed = c.node_addr(0);

    let first = c.wire().join(&seed, &c.node_addr(1)).await.unwrap();
    let second = c.wire().join(&seed, &c.node_addr(1)).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(c.ctx(0).registry().len(), 2);
}

/// A departing node announces itself to every peer, and each drops it
/// from its membership view.
#[tokio::test]
async fn test_leave_removes_departed_node_from_peer_views() {
    let c = IntegrationCluster::new(3, ClusterConfig::default());
    let departing = c.node_addr(2);

    for i in 0..2 {
        c.wire().leave(&c.node_addr(i), &departing).await.unwrap();
    }

    assert_eq!(c.ctx(0).registry().len(), 2);
    assert_eq!(c.ctx(1).registry().len(), 2);
    assert!(c.ctx(0).registry().get(&departing).is_none());
    assert!(c.ctx(1).registry().get(&departing).is_none());
}

/// Joining through an unreachable seed fails without touching local state.
#[tokio::test]
async fn test_join_unreachable_seed_fails() {
    let c = IntegrationCluster::new_unjoined(2, ClusterConfig::default());
    c.take_down(0);

    let result = c.wire().join(&c.node_addr(0), &c.node_addr(1)).await;
    assert!(result.is_err());
    assert_eq!(c.ctx(1).registry().len(), 1);
}
