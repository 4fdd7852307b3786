//! # Dispatcher
//!
//! Routes one outbound event to the connections a [`Target`] resolves to.
//! Deliveries run concurrently; a failing connection is logged and counted but
//! never stops the others.

use crate::clients::RegistryClient;
use crate::model::{ConnectionId, HubEvent, Target};
use crate::registry_actor::RegistryError;
use crate::transport::{DeliveryError, Transport};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Outcome of one [`Dispatcher::send`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: Vec<(ConnectionId, DeliveryError)>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: RegistryClient,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(registry: RegistryClient, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Delivers `event` to every connection `target` resolves to.
    ///
    /// Only fails when the registry cannot be reached.
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub async fn send(&self, target: Target, event: HubEvent) -> Result<DispatchReport, RegistryError> {
        let recipients = self.registry.resolve(target).await?;
        debug!(recipients = recipients.len(), "Dispatching");

        let deliveries = recipients.iter().map(|connection_id| {
            let transport = Arc::clone(&self.transport);
            let event = &event;
            async move {
                let result = transport.deliver(connection_id, event).await;
                (connection_id, result)
            }
        });

        let mut report = DispatchReport {
            attempted: recipients.len(),
            ..Default::default()
        };
        for (connection_id, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(%connection_id, error = %e, "Delivery failed");
                    report.failed.push((connection_id.clone(), e));
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use tokio_util::sync::CancellationToken;

    async fn setup(ids: &[&str]) -> (Dispatcher, Arc<RecordingTransport>) {
        let (actor, registry) = crate::registry_actor::new(16, CancellationToken::new());
        tokio::spawn(actor.run());
        for id in ids {
            registry.register(ConnectionId::from(*id), None).await.unwrap();
        }
        let transport = Arc::new(RecordingTransport::new());
        (Dispatcher::new(registry, transport.clone()), transport)
    }

    #[tokio::test]
    async fn send_all_attempts_every_connection_despite_failures() {
        let (dispatcher, transport) = setup(&["a", "b", "c"]).await;
        transport.fail_for(ConnectionId::from("b"));

        let report = dispatcher.send(Target::All, HubEvent::Finished).await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ConnectionId::from("b"));
        assert_eq!(transport.deliveries().len(), 2);
    }

    #[tokio::test]
    async fn caller_target_reaches_only_the_caller() {
        let (dispatcher, transport) = setup(&["a", "b"]).await;

        let report = dispatcher
            .send(
                Target::Caller(ConnectionId::from("a")),
                HubEvent::ReceiveOrderUpdate("Brewing".into()),
            )
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert!(transport.events_for(&ConnectionId::from("b")).is_empty());
        assert_eq!(
            transport.events_for(&ConnectionId::from("a")),
            vec![HubEvent::ReceiveOrderUpdate("Brewing".into())]
        );
    }

    #[tokio::test]
    async fn empty_group_attempts_nothing() {
        let (dispatcher, transport) = setup(&["a"]).await;
        let report = dispatcher
            .send(Target::group("nobody-here"), HubEvent::Finished)
            .await
            .unwrap();
        assert_eq!(report, DispatchReport::default());
        assert!(transport.deliveries().is_empty());
    }

    #[tokio::test]
    async fn all_except_skips_one_connection() {
        let (dispatcher, transport) = setup(&["a", "b", "c"]).await;
        let report = dispatcher
            .send(Target::AllExcept(ConnectionId::from("a")), HubEvent::Finished)
            .await
            .unwrap();
        assert_eq!(report.attempted, 2);
        assert!(transport.events_for(&ConnectionId::from("a")).is_empty());
    }
}
