//! Where watch sessions read order status from.

pub mod order_book;

pub use order_book::OrderBookStatusSource;

use crate::model::{CheckResult, OrderId, StatusPayload};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatusSourceError {
    /// The order does not exist; retrying will not help.
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// A transient failure; the next tick may succeed.
    #[error("Status source unavailable: {0}")]
    Unavailable(String),
}

/// Returns the current status snapshot for an order.
///
/// Called once per watcher tick with the last update that session sent, so
/// `is_new` is relative to the caller and concurrent watchers of one order do
/// not affect each other. Reads must not advance the order. Implementations
/// must tolerate concurrent calls.
#[async_trait]
pub trait OrderStatusSource: Send + Sync {
    async fn check_update(
        &self,
        order_id: OrderId,
        last_seen: Option<&StatusPayload>,
    ) -> Result<CheckResult, StatusSourceError>;
}
