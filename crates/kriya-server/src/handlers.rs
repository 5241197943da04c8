//! Node HTTP request handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use kriya_net::{JoinRequest, JoinResponse, LeaveRequest, ListEntry, NodeStats, REPLICATION_HEADER};
use kriya_types::{Node, META_CHECKSUM, META_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;
use crate::error::ServerError;

/// Whether a request is internal replication traffic (fan-out write,
/// rebalance move, or redundancy push from another node).
fn is_replicated(headers: &HeaderMap) -> bool {
    headers.contains_key(REPLICATION_HEADER)
}

/// Verify the `x-access-key` / `x-secret-key` pair on a client mutation.
fn check_identity(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    };
    if state.identity.verify(header("x-access-key"), header("x-secret-key")) {
        Ok(())
    } else {
        warn!("rejected mutation with invalid credentials");
        Err(ServerError::Unauthorized)
    }
}

// -----------------------------------------------------------------------
// GET /probe, GET /stats
// -----------------------------------------------------------------------

/// Liveness probe: respond with the current load report.
pub(crate) async fn probe(
    State(state): State<AppState>,
) -> Result<Json<NodeStats>, ServerError> {
    let object_count = state.store.object_count().await? as u64;
    Ok(Json(NodeStats { object_count }))
}

/// Load report for the rebalancer.
pub(crate) async fn stats(
    State(state): State<AppState>,
) -> Result<Json<NodeStats>, ServerError> {
    probe(State(state)).await
}

// -----------------------------------------------------------------------
// GET /list?limit=N
// -----------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct ListParams {
    limit: Option<usize>,
}

/// List up to `limit` objects with base64 payloads, in stable key order.
pub(crate) async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ListEntry>>, ServerError> {
    let limit = params.limit.unwrap_or(usize::MAX);
    let objects = state.store.list(limit).await?;
    let entries = objects
        .iter()
        .map(|(key, data)| ListEntry::encode(key, data))
        .collect();
    Ok(Json(entries))
}

// -----------------------------------------------------------------------
// POST /cluster/join
// -----------------------------------------------------------------------

/// Register a joining node and answer with the full membership view.
///
/// Idempotent: a node re-announcing itself (restart, retried join) gets
/// the membership view without an error.
pub(crate) async fn join(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ServerError> {
    match state.ctx.add_node(Node::new(request.addr.clone())) {
        Ok(()) => info!(addr = %request.addr, "node joined via seed request"),
        Err(e) => warn!(addr = %request.addr, error = %e, "join for known node, answering anyway"),
    }
    Ok(Json(JoinResponse {
        members: state.ctx.nodes(),
    }))
}

// -----------------------------------------------------------------------
// POST /cluster/leave
// -----------------------------------------------------------------------

/// Drop a departing node from the registry.
///
/// Idempotent: a leave for an unknown node is acknowledged without
/// effect, so a departure announcement can be retried.
pub(crate) async fn leave(
    State(state): State<AppState>,
    Json(request): Json<LeaveRequest>,
) -> StatusCode {
    if state.ctx.remove_node(&request.addr) {
        info!(addr = %request.addr, "node announced departure");
    }
    StatusCode::NO_CONTENT
}

// -----------------------------------------------------------------------
// PUT /objects/{key}
// -----------------------------------------------------------------------

/// Response body for a client `PUT /objects/{key}`.
#[derive(Serialize, Deserialize)]
pub(crate) struct PutResponse {
    /// The stored key.
    pub key: String,
    /// Payload size in bytes.
    pub size: usize,
    /// CRC32 checksum of the payload.
    pub checksum: u32,
    /// Peers that acknowledged the replica write.
    pub replicas: usize,
}

/// Store an object locally, then fan it out to peers.
///
/// Internal replication traffic stops at the local write. A client write
/// succeeds once the local copy is durable; a replication shortfall only
/// degrades cluster health, it never fails the request.
pub(crate) async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PutResponse>, ServerError> {
    let internal = is_replicated(&headers);
    if !internal {
        check_identity(&state, &headers)?;
    }

    let checksum = crc32fast::hash(&body);
    let size = body.len();
    state.store.write(&key, body.clone()).await?;
    state
        .store
        .write_metadata(&key, META_CHECKSUM, &checksum.to_string())
        .await?;
    state
        .store
        .write_metadata(&key, META_SIZE, &size.to_string())
        .await?;

    let replicas = if internal {
        0
    } else {
        let outcome = state.replication.replicate(&key, &body).await;
        if !outcome.is_healthy() {
            warn!(
                key,
                succeeded = outcome.succeeded,
                attempted = outcome.attempted,
                "write stored locally but replication degraded"
            );
        }
        outcome.succeeded
    };

    info!(key, size, internal, "object stored");
    Ok(Json(PutResponse {
        key,
        size,
        checksum,
        replicas,
    }))
}

// -----------------------------------------------------------------------
// GET /objects/{key}
// -----------------------------------------------------------------------

/// Fetch an object, verifying its recorded checksum first.
pub(crate) async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ServerError> {
    let data = state.store.read(&key).await?;

    // An empty field means the object predates checksumming; serve as-is.
    let recorded = state.store.read_metadata(&key, META_CHECKSUM).await?;
    if !recorded.is_empty() {
        let matches = recorded
            .parse::<u32>()
            .map(|stored| stored == crc32fast::hash(&data))
            .unwrap_or(false);
        if !matches {
            warn!(key, "stored object failed checksum verification");
            return Err(ServerError::ChecksumMismatch { key });
        }
    }

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/octet-stream")
        .body(Body::from(data))
        .map_err(|e| ServerError::InvalidRequest {
            message: e.to_string(),
        })
}

// -----------------------------------------------------------------------
// HEAD /objects/{key}
// -----------------------------------------------------------------------

/// Existence check used by peers' redundancy sweeps.
pub(crate) async fn head_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ServerError> {
    if state.store.exists(&key).await? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

// -----------------------------------------------------------------------
// DELETE /objects/{key}
// -----------------------------------------------------------------------

/// Delete an object locally and, for client requests, across the cluster.
/// Idempotent: deleting an absent key is a success.
pub(crate) async fn delete_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    let internal = is_replicated(&headers);
    if !internal {
        check_identity(&state, &headers)?;
    }

    state.store.delete(&key).await?;

    if !internal {
        let outcome = state.replication.delete(&key).await;
        if !outcome.is_healthy() {
            warn!(
                key,
                succeeded = outcome.succeeded,
                attempted = outcome.attempted,
                "delete applied locally but fan-out degraded"
            );
        }
    }

    info!(key, internal, "object deleted");
    Ok(StatusCode::NO_CONTENT)
}
