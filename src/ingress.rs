//! Entry point for new orders coming from outside the messaging channel
//! (e.g. an HTTP handler).

use crate::clients::OrderClient;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::model::{HubEvent, Order, OrderCreate, OrderId, Target};
use crate::order_actor::OrderError;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngressError {
    #[error("Order rejected: {0}")]
    Rejected(#[from] OrderError),
}

/// The accepted order and how its `NewOrder` broadcast went.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub order: Order,
    /// `None` when the registry could not be reached; the order is kept regardless.
    pub broadcast: Option<DispatchReport>,
}

#[derive(Clone)]
pub struct OrderIngress {
    orders: OrderClient,
    dispatcher: Dispatcher,
}

impl OrderIngress {
    pub fn new(orders: OrderClient, dispatcher: Dispatcher) -> Self {
        Self { orders, dispatcher }
    }

    /// Stores the order, then broadcasts `NewOrder` to every connection.
    #[instrument(skip(self, params), fields(product = %params.product, size = %params.size))]
    pub async fn submit_order(&self, params: OrderCreate) -> Result<Submission, IngressError> {
        let id: OrderId = self.orders.create_order(params.clone()).await?;
        let order = Order::new(id, params.product, params.size);
        info!(order_id = %id, "Order accepted");

        let broadcast = match self
            .dispatcher
            .send(Target::All, HubEvent::NewOrder(order.clone()))
            .await
        {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(order_id = %id, error = %e, "NewOrder broadcast failed");
                None
            }
        };

        Ok(Submission { order, broadcast })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockClient;
    use crate::framework::FrameworkError;
    use crate::model::ConnectionId;
    use crate::testing::RecordingTransport;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    async fn dispatcher_with(ids: &[&str]) -> (Dispatcher, Arc<RecordingTransport>) {
        let (actor, registry) = crate::registry_actor::new(16, CancellationToken::new());
        tokio::spawn(actor.run());
        for id in ids {
            registry.register(ConnectionId::from(*id), None).await.unwrap();
        }
        let transport = Arc::new(RecordingTransport::new());
        (Dispatcher::new(registry, transport.clone()), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_order_is_broadcast_to_everyone() {
        let (dispatcher, transport) = dispatcher_with(&["a", "b"]).await;
        let mut mock = MockClient::<Order>::new();
        mock.expect_create().return_ok(OrderId(1));

        let ingress = OrderIngress::new(OrderClient::new(mock.client()), dispatcher);
        let submission = ingress
            .submit_order(OrderCreate::new("Americano", "Large"))
            .await
            .unwrap();

        assert_eq!(submission.order.id, OrderId(1));
        assert_eq!(submission.broadcast.unwrap().delivered, 2);
        let expected = HubEvent::NewOrder(Order::new(OrderId(1), "Americano", "Large"));
        assert_eq!(transport.events_for(&ConnectionId::from("a")), vec![expected.clone()]);
        assert_eq!(transport.events_for(&ConnectionId::from("b")), vec![expected]);
        mock.verify();
    }

    #[tokio::test]
    async fn rejected_order_is_not_broadcast() {
        let (dispatcher, transport) = dispatcher_with(&["a"]).await;
        let mut mock = MockClient::<Order>::new();
        mock.expect_create()
            .return_err(FrameworkError::EntityError(Box::new(
                OrderError::ValidationError("size is required".into()),
            )));

        let ingress = OrderIngress::new(OrderClient::new(mock.client()), dispatcher);
        let result = ingress.submit_order(OrderCreate::new("Latte", "")).await;

        assert_eq!(
            result,
            Err(IngressError::Rejected(OrderError::ValidationError(
                "size is required".into()
            )))
        );
        assert!(transport.deliveries().is_empty());
    }
}
