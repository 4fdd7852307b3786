//! In-process transport: each attached connection owns a bounded channel of
//! [`OutboundMessage`]s that a writer task (or a test) drains.

use crate::model::{ConnectionId, HubEvent, OutboundMessage};
use crate::transport::{DeliveryError, Transport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Outbound side of one client session.
pub struct ClientConnection {
    pub id: ConnectionId,
    tx: mpsc::Sender<OutboundMessage>,
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    pub fn new(id: ConnectionId, tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id,
            tx,
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Queues a message without waiting. Counts it as dropped on failure.
    pub fn send(&self, message: OutboundMessage) -> Result<(), DeliveryError> {
        match self.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
                match e {
                    mpsc::error::TrySendError::Full(_) => {
                        Err(DeliveryError::Backpressure(self.id.clone()))
                    }
                    mpsc::error::TrySendError::Closed(_) => {
                        Err(DeliveryError::ConnectionGone(self.id.clone()))
                    }
                }
            }
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }
}

/// [`Transport`] backed by per-connection tokio channels.
pub struct ChannelTransport {
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    buffer_size: usize,
}

impl ChannelTransport {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Opens an outbound channel for `id` and returns its receiving end.
    ///
    /// Re-attaching replaces the previous channel; its receiver sees the stream end.
    pub async fn attach(&self, id: ConnectionId) -> mpsc::Receiver<OutboundMessage> {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let connection = Arc::new(ClientConnection::new(id.clone(), tx));
        let previous = self.connections.write().await.insert(id.clone(), connection);
        if previous.is_some() {
            debug!(connection_id = %id, "Outbound channel replaced");
        }
        rx
    }

    /// Closes the outbound channel for `id`. Returns whether one existed.
    pub async fn detach(&self, id: &ConnectionId) -> bool {
        self.connections.write().await.remove(id).is_some()
    }

    pub async fn connection(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.read().await.get(id).cloned()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn deliver(
        &self,
        connection_id: &ConnectionId,
        event: &HubEvent,
    ) -> Result<(), DeliveryError> {
        let connection = self
            .connection(connection_id)
            .await
            .ok_or_else(|| DeliveryError::ConnectionGone(connection_id.clone()))?;

        let message = event
            .to_message()
            .map_err(|e| DeliveryError::Encode(e.to_string()))?;

        connection.send(message).inspect_err(|e| {
            warn!(%connection_id, event = event.name(), error = %e, "Delivery dropped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deliver_lands_in_attached_channel() {
        let transport = ChannelTransport::new(4);
        let id = ConnectionId::from("conn_1");
        let mut rx = transport.attach(id.clone()).await;

        transport.deliver(&id, &HubEvent::Finished).await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.target, "Finished");
        assert!(msg.arguments.is_empty());
    }

    #[tokio::test]
    async fn unknown_connection_is_gone() {
        let transport = ChannelTransport::new(4);
        let id = ConnectionId::from("nobody");
        let result = transport.deliver(&id, &HubEvent::Finished).await;
        assert_eq!(result, Err(DeliveryError::ConnectionGone(id)));
    }

    #[tokio::test]
    async fn full_buffer_reports_backpressure() {
        let transport = ChannelTransport::new(1);
        let id = ConnectionId::from("slow");
        let _rx = transport.attach(id.clone()).await;

        transport.deliver(&id, &HubEvent::Finished).await.unwrap();
        let result = transport.deliver(&id, &HubEvent::Finished).await;
        assert_eq!(result, Err(DeliveryError::Backpressure(id.clone())));

        let connection = transport.connection(&id).await.unwrap();
        assert_eq!(connection.drop_count(), 1);
    }

    #[tokio::test]
    async fn dropped_receiver_is_gone() {
        let transport = ChannelTransport::new(4);
        let id = ConnectionId::from("closed");
        drop(transport.attach(id.clone()).await);

        let result = transport.deliver(&id, &HubEvent::Finished).await;
        assert_eq!(result, Err(DeliveryError::ConnectionGone(id)));
    }

    #[tokio::test]
    async fn detach_removes_connection() {
        let transport = ChannelTransport::new(4);
        let id = ConnectionId::from("conn_1");
        let _rx = transport.attach(id.clone()).await;
        assert_eq!(transport.connection_count().await, 1);

        assert!(transport.detach(&id).await);
        assert!(!transport.detach(&id).await);
        assert_eq!(transport.connection_count().await, 0);
    }
}
