/// Represents a customer order.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](crate::framework::ActorEntity) trait,
/// allowing it to be kept by a [`ResourceActor`](crate::framework::ResourceActor).
///
/// See [`impl ActorEntity for Order`](#impl-ActorEntity-for-Order) for details on:
/// - Creation parameters ([`OrderCreate`])
/// - Custom actions ([`OrderAction`](crate::order_actor::OrderAction))
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tokio::time::Instant;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An accepted order. Identity is `id`; the record never changes after creation.
///
/// `accepted_at` starts the order's preparation clock and is not part of the
/// wire payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product: String,
    pub size: String,
    #[serde(skip, default = "Instant::now")]
    pub(crate) accepted_at: Instant,
}

impl Order {
    /// Creates a new Order; its preparation clock starts now.
    pub fn new(id: OrderId, product: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            id,
            product: product.into(),
            size: size.into(),
            accepted_at: Instant::now(),
        }
    }
}

/// Payload for creating a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreate {
    pub product: String,
    pub size: String,
}

impl OrderCreate {
    pub fn new(product: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            size: size.into(),
        }
    }
}
