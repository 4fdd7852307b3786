//! Demo: a listener and a customer connect, the customer's order is
//! broadcast, and the customer watches it until it is picked up.

use order_hub::lifecycle::{setup_tracing, HubConfig, OrderHub};
use order_hub::model::{ConnectionId, IdentityToken, OutboundMessage};
use order_hub::transport::ChannelTransport;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, Instrument};

// Logs everything one connection receives until its channel closes.
fn spawn_inbox(
    name: &'static str,
    mut inbox: mpsc::Receiver<OutboundMessage>,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut received = 0;
        while let Some(message) = inbox.recv().await {
            received += 1;
            info!(connection = name, event = %message.target, arguments = ?message.arguments, "Received");
        }
        received
    })
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = HubConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting order hub demo");

    let transport = Arc::new(ChannelTransport::new(config.connection_buffer_size));
    let hub = OrderHub::new(config, transport.clone());

    let listener = ConnectionId::from("listener");
    let customer = ConnectionId::generate();

    let listener_inbox = spawn_inbox("listener", transport.attach(listener.clone()).await);
    let customer_inbox = spawn_inbox("customer", transport.attach(customer.clone()).await);

    hub.on_connect(listener.clone(), None)
        .await
        .map_err(|e| e.to_string())?;
    hub.on_connect(customer.clone(), Some(IdentityToken::new("demo-customer")))
        .await
        .map_err(|e| e.to_string())?;
    hub.join_group(customer.clone(), "AmericanoGroup")
        .await
        .map_err(|e| e.to_string())?;

    let span = tracing::info_span!("order_submission");
    let order_id = async {
        info!("Submitting order");
        hub.submit_order("Americano", "Large").await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let span = tracing::info_span!("order_watch", %order_id);
    let outcome = hub
        .watch_order_status(customer.clone(), order_id)
        .instrument(span)
        .await;

    match outcome {
        Ok(Ok(outcome)) => info!(?outcome, "Watch completed"),
        Ok(Err(e)) => error!(error = %e, "Watch failed"),
        Err(e) => error!(error = %e, "Watch task failed"),
    }

    hub.on_disconnect(customer.clone())
        .await
        .map_err(|e| e.to_string())?;
    hub.on_disconnect(listener.clone())
        .await
        .map_err(|e| e.to_string())?;
    transport.detach(&customer).await;
    transport.detach(&listener).await;

    hub.shutdown().await?;

    for (name, inbox) in [("listener", listener_inbox), ("customer", customer_inbox)] {
        match inbox.await {
            Ok(received) => info!(connection = name, received, "Inbox closed"),
            Err(e) => error!(connection = name, error = %e, "Inbox task failed"),
        }
    }

    info!("Demo completed successfully");
    Ok(())
}
