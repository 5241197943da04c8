//! Peer wire client for inter-node operations.
//!
//! This crate provides:
//!
//! - [`PeerClient`] — the trait the cluster core uses to talk to peers,
//!   so tests can substitute an in-process implementation.
//! - [`HttpPeerClient`] — the production implementation over HTTP with a
//!   bounded per-request timeout.
//! - Wire DTOs shared between the client and the server surface.

mod client;
mod error;
mod message;

pub use client::{HttpPeerClient, PeerClient};
pub use error::NetError;
pub use message::{JoinRequest, JoinResponse, LeaveRequest, ListEntry, NodeStats};

/// Header marking a request as internal replication traffic.
///
/// The receiving node applies such a write locally without an identity
/// check and without fanning it out again.
pub const REPLICATION_HEADER: &str = "x-kriya-replicated";
