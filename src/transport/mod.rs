//! The seam between the hub and whatever carries bytes to clients.
//!
//! The hub only ever asks a [`Transport`] to deliver one event to one
//! connection; framing and encoding belong to the implementation.

pub mod channel;

pub use channel::{ChannelTransport, ClientConnection};

use crate::model::{ConnectionId, HubEvent};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Connection gone: {0}")]
    ConnectionGone(ConnectionId),

    #[error("Outbound buffer full for {0}")]
    Backpressure(ConnectionId),

    #[error("Failed to encode event: {0}")]
    Encode(String),
}

/// Delivers an event to a single connection.
///
/// Implementations must not block on a slow client: a delivery either lands in
/// the connection's outbound buffer or fails.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, connection_id: &ConnectionId, event: &HubEvent)
        -> Result<(), DeliveryError>;
}
