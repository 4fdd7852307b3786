use crate::clients::OrderClient;
use crate::model::{CheckResult, OrderId, StatusPayload};
use crate::order_actor::OrderError;
use crate::status::{OrderStatusSource, StatusSourceError};
use async_trait::async_trait;

/// Status source backed by the in-process order book.
#[derive(Clone)]
pub struct OrderBookStatusSource {
    orders: OrderClient,
}

impl OrderBookStatusSource {
    pub fn new(orders: OrderClient) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl OrderStatusSource for OrderBookStatusSource {
    async fn check_update(
        &self,
        order_id: OrderId,
        last_seen: Option<&StatusPayload>,
    ) -> Result<CheckResult, StatusSourceError> {
        self.orders
            .check_update(order_id, last_seen.cloned())
            .await
            .map_err(|e| match e {
                OrderError::NotFound(id) => StatusSourceError::UnknownOrder(id),
                other => StatusSourceError::Unavailable(other.to_string()),
            })
    }
}
