//! # Order Client
//!
//! High-level API for the order book actor.
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{CheckResult, Order, OrderCreate, OrderId, StatusPayload};
use crate::order_actor::{OrderAction, OrderError};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    /// Stores a new order and returns its id. Validation happens in `Order::on_create`.
    #[instrument(skip(self))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<OrderId, OrderError> {
        debug!("Sending create_order to actor");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Reads an order's status; `is_new` is relative to `last_seen`.
    #[instrument(skip(self, last_seen))]
    pub async fn check_update(
        &self,
        id: OrderId,
        last_seen: Option<StatusPayload>,
    ) -> Result<CheckResult, OrderError> {
        debug!("Sending check_update to actor");
        self.inner
            .perform_action(id, OrderAction::CheckUpdate { last_seen })
            .await
            .map_err(|e| match e {
                FrameworkError::NotFound(_) => OrderError::NotFound(id),
                other => Self::map_error(other),
            })
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::EntityError(inner) => match inner.downcast::<OrderError>() {
                Ok(order_error) => *order_error,
                Err(other) => OrderError::ActorCommunicationError(other.to_string()),
            },
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
