use crate::model::{ConnectionId, OrderId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Connection not registered: {0}")]
    NotConnected(ConnectionId),

    #[error("Connection {connection_id} is already watching order {order_id}")]
    AlreadyWatching {
        connection_id: ConnectionId,
        order_id: OrderId,
    },

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
