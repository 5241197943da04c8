//! Wire DTOs exchanged between nodes.
//!
//! All peer endpoints speak JSON except the raw object bodies on
//! `PUT`/`GET /objects/{key}`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use kriya_types::{Node, NodeAddr};
use serde::{Deserialize, Serialize};

/// Load report returned by `GET /probe` and `GET /stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Number of objects the node currently holds.
    pub object_count: u64,
}

/// Body of `POST /cluster/join`: a node announcing itself to a seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Address the joining node is reachable at.
    pub addr: NodeAddr,
}

/// Response to a join: the seed's current membership view, so the joiner
/// can populate its own registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    /// All members the seed knows about, including itself and the joiner.
    pub members: Vec<Node>,
}

/// Body of `POST /cluster/leave`: a node announcing its departure so
/// peers drop it from their registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Address of the departing node.
    pub addr: NodeAddr,
}

/// One object in a `GET /list` response. The payload is base64-encoded
/// so the listing can travel as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Object key.
    pub key: String,
    /// Base64-encoded payload.
    pub data: String,
}

impl ListEntry {
    /// Encode a raw object into a wire entry.
    pub fn encode(key: &str, data: &[u8]) -> Self {
        Self {
            key: key.to_string(),
            data: BASE64.encode(data),
        }
    }

    /// Decode the payload back into bytes.
    pub fn decode(&self) -> Result<Bytes, base64::DecodeError> {
        BASE64.decode(&self.data).map(Bytes::from)
    }
}
