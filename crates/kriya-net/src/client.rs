//! HTTP peer client.

use std::time::Duration;

use bytes::Bytes;
use kriya_types::{Node, NodeAddr};
use tracing::debug;

use crate::error::NetError;
use crate::message::{JoinRequest, JoinResponse, LeaveRequest, ListEntry, NodeStats};
use crate::REPLICATION_HEADER;

/// Operations the cluster core performs against peer nodes.
///
/// Abstracting the wire behind a trait lets the cluster logic be tested
/// with an in-process implementation, the same way the store is.
#[async_trait::async_trait]
pub trait PeerClient: Send + Sync {
    /// Liveness probe. Returns the peer's load report on success.
    async fn probe(&self, addr: &NodeAddr) -> Result<NodeStats, NetError>;

    /// Replication write: store `data` under `key` on the peer.
    async fn put_object(&self, addr: &NodeAddr, key: &str, data: Bytes)
        -> Result<(), NetError>;

    /// Replication delete. Idempotent on the peer side.
    async fn delete_object(&self, addr: &NodeAddr, key: &str) -> Result<(), NetError>;

    /// Whether the peer holds an object (redundancy sweep).
    async fn object_exists(&self, addr: &NodeAddr, key: &str) -> Result<bool, NetError>;

    /// Fetch the peer's current object count (rebalancer).
    async fn fetch_stats(&self, addr: &NodeAddr) -> Result<NodeStats, NetError>;

    /// List up to `limit` objects from the peer (rebalancer move source).
    async fn list_objects(
        &self,
        addr: &NodeAddr,
        limit: usize,
    ) -> Result<Vec<(String, Bytes)>, NetError>;

    /// Announce `local` to a seed node and receive its membership view.
    async fn join(&self, seed: &NodeAddr, local: &NodeAddr) -> Result<Vec<Node>, NetError>;

    /// Announce `local`'s departure to a peer (graceful shutdown).
    async fn leave(&self, peer: &NodeAddr, local: &NodeAddr) -> Result<(), NetError>;
}

/// Production [`PeerClient`] speaking HTTP with a bounded per-request
/// timeout. A timed-out call is indistinguishable from a connection
/// failure to callers.
pub struct HttpPeerClient {
    http: reqwest::Client,
}

impl HttpPeerClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, NetError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetError::Unreachable {
                addr: NodeAddr::new("", 0),
                reason: e.to_string(),
            })?;
        Ok(Self { http })
    }

    fn url(addr: &NodeAddr, path: &str) -> String {
        format!("http://{addr}{path}")
    }

    fn check_status(addr: &NodeAddr, status: reqwest::StatusCode) -> Result<(), NetError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(NetError::Status {
                addr: addr.clone(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait::async_trait]
impl PeerClient for HttpPeerClient {
    async fn probe(&self, addr: &NodeAddr) -> Result<NodeStats, NetError> {
        let response = self
            .http
            .get(Self::url(addr, "/probe"))
            .send()
            .await
            .map_err(|e| NetError::from_request(addr, e))?;
        Self::check_status(addr, response.status())?;
        response.json().await.map_err(|e| NetError::Body {
            addr: addr.clone(),
            reason: e.to_string(),
        })
    }

    async fn put_object(
        &self,
        addr: &NodeAddr,
        key: &str,
        data: Bytes,
    ) -> Result<(), NetError> {
        debug!(%addr, key, size = data.len(), "replicating object to peer");
        let response = self
            .http
            .put(Self::url(addr, &format!("/objects/{key}")))
            .header(REPLICATION_HEADER, "1")
            .body(data)
            .send()
            .await
            .map_err(|e| NetError::from_request(addr, e))?;
        Self::check_status(addr, response.status())
    }

    async fn delete_object(&self, addr: &NodeAddr, key: &str) -> Result<(), NetError> {
        debug!(%addr, key, "deleting object on peer");
        let response = self
            .http
            .delete(Self::url(addr, &format!("/objects/{key}")))
            .header(REPLICATION_HEADER, "1")
            .send()
            .await
            .map_err(|e| NetError::from_request(addr, e))?;
        Self::check_status(addr, response.status())
    }

    async fn object_exists(&self, addr: &NodeAddr, key: &str) -> Result<bool, NetError> {
        let response = self
            .http
            .head(Self::url(addr, &format!("/objects/{key}")))
            .send()
            .await
            .map_err(|e| NetError::from_request(addr, e))?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(NetError::Status {
                addr: addr.clone(),
                status,
            }),
        }
    }

    async fn fetch_stats(&self, addr: &NodeAddr) -> Result<NodeStats, NetError> {
        let response = self
            .http
            .get(Self::url(addr, "/stats"))
            .send()
            .await
            .map_err(|e| NetError::from_request(addr, e))?;
        Self::check_status(addr, response.status())?;
        response.json().await.map_err(|e| NetError::Body {
            addr: addr.clone(),
            reason: e.to_string(),
        })
    }

    async fn list_objects(
        &self,
        addr: &NodeAddr,
        limit: usize,
    ) -> Result<Vec<(String, Bytes)>, NetError> {
        let response = self
            .http
            .get(Self::url(addr, &format!("/list?limit={limit}")))
            .send()
            .await
            .map_err(|e| NetError::from_request(addr, e))?;
        Self::check_status(addr, response.status())?;
        let entries: Vec<ListEntry> = response.json().await.map_err(|e| NetError::Body {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let data = entry.decode().map_err(|e| NetError::Body {
                addr: addr.clone(),
                reason: format!("bad base64 for key {}: {e}", entry.key),
            })?;
            out.push((entry.key, data));
        }
        Ok(out)
    }

    async fn join(&self, seed: &NodeAddr, local: &NodeAddr) -> Result<Vec<Node>, NetError> {
        debug!(%seed, "sending join request to seed");
        let response = self
            .http
            .post(Self::url(seed, "/cluster/join"))
            .json(&JoinRequest {
                addr: local.clone(),
            })
            .send()
            .await
            .map_err(|e| NetError::from_request(seed, e))?;
        Self::check_status(seed, response.status())?;
        let body: JoinResponse = response.json().await.map_err(|e| NetError::Body {
            addr: seed.clone(),
            reason: e.to_string(),
        })?;
        Ok(body.members)
    }

    async fn leave(&self, peer: &NodeAddr, local: &NodeAddr) -> Result<(), NetError> {
        debug!(%peer, "announcing departure to peer");
        let response = self
            .http
            .post(Self::url(peer, "/cluster/leave"))
            .json(&LeaveRequest {
                addr: local.clone(),
            })
            .send()
            .await
            .map_err(|e| NetError::from_request(peer, e))?;
        Self::check_status(peer, response.status())
    }
}
