//! HTTP surface for a Kriya node.
//!
//! One axum router serves both audiences:
//!
//! **Peer wire** (consumed by other nodes' [`kriya_net::HttpPeerClient`]):
//!
//! - `GET  /probe` — liveness probe, returns `{object_count}`
//! - `GET  /stats` — load report, returns `{object_count}`
//! - `GET  /list?limit=N` — object listing for rebalance moves
//! - `POST /cluster/join` — membership announcement from a joining node
//! - `POST /cluster/leave` — departure announcement from a stopping node
//!
//! **Object API** (clients and peers):
//!
//! - `PUT    /objects/{key}` — store an object (identity required, unless
//!   marked as internal replication traffic)
//! - `GET    /objects/{key}` — fetch an object, checksum-verified
//! - `HEAD   /objects/{key}` — existence check
//! - `DELETE /objects/{key}` — remove an object (identity required, unless
//!   internal)
//!
//! Requests carrying the `x-kriya-replicated` header are writes from
//! another node's replication fan-out or rebalance move. They are applied
//! locally without an identity check and without fanning out again, which
//! is what keeps a replicated write from ricocheting around the cluster.

mod error;
mod handlers;
mod identity;


use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use kriya_cluster::{ClusterContext, ReplicationCoordinator};
use kriya_store::ObjectStore;

pub use error::ServerError;
pub use identity::{Identity, StaticIdentity};

/// Shared application state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The local object store.
    pub store: Arc<dyn ObjectStore>,
    /// Shared cluster state (registry, config, events).
    pub ctx: Arc<ClusterContext>,
    /// Fan-out coordinator for client-initiated writes and deletes.
    pub replication: Arc<ReplicationCoordinator>,
    /// Credential verifier for client mutations.
    pub identity: Arc<dyn Identity>,
}

/// Configuration for creating a [`NodeServer`].
pub struct NodeServerConfig {
    /// The local object store.
    pub store: Arc<dyn ObjectStore>,
    /// Shared cluster state.
    pub ctx: Arc<ClusterContext>,
    /// Fan-out coordinator.
    pub replication: Arc<ReplicationCoordinator>,
    /// Credential verifier.
    pub identity: Arc<dyn Identity>,
}

/// HTTP server for one storage node.
pub struct NodeServer {
    router: Router,
}

impl NodeServer {
    /// Create a server over the given node state.
    pub fn new(config: NodeServerConfig) -> Self {
        let state = AppState {
            store: config.store,
            ctx: config.ctx,
            replication: config.replication,
            identity: config.identity,
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the axum [`Router`].
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/probe", get(handlers::probe))
            .route("/stats", get(handlers::stats))
            .route("/list", get(handlers::list))
            .route("/cluster/join", post(handlers::join))
            .route("/cluster/leave", post(handlers::leave))
            // Keys may contain slashes.
            .route(
                "/objects/{*key}",
                put(handlers::put_object)
                    .get(handlers::get_object)
                    .head(handlers::head_object)
                    .delete(handlers::delete_object),
            )
            .with_state(state)
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve with graceful shutdown triggered by the given future.
    ///
    /// When `shutdown` completes, the server stops accepting new
    /// connections and waits for in-flight requests to finish.
    pub async fn serve_with_shutdown(
        self,
        addr: &str,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "node server listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
