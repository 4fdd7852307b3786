use crate::clients::{OrderClient, RegistryClient};
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::handlers::{
    HandlerTable, InvocationError, WatchOrderHandler, GET_UPDATE_FOR_ORDER, WATCH_ORDER_STATUS,
};
use crate::ingress::{IngressError, OrderIngress, Submission};
use crate::lifecycle::HubConfig;
use crate::model::{CallContext, ConnectionId, HubEvent, IdentityToken, OrderCreate, OrderId, Target};
use crate::order_actor::{OrderContext, PreparationPipeline};
use crate::registry_actor::{Departure, MembershipChange, RegistryError};
use crate::status::{OrderBookStatusSource, OrderStatusSource};
use crate::transport::Transport;
use crate::watcher::{OrderStatusWatcher, WatchError, WatchOutcome};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// The runtime orchestrator for the notification hub.
///
/// `OrderHub` is responsible for:
/// - **Lifecycle Management**: starting the registry and order-book actors and
///   stopping them again
/// - **Dependency Wiring**: building the dispatcher, ingress, watcher and
///   handler table on top of the actor clients
/// - **Session Tracking**: every watch session runs on a tracked task that
///   [`shutdown`](Self::shutdown) cancels and waits for
///
/// # Example
///
/// ```ignore
/// let transport = Arc::new(ChannelTransport::new(64));
/// let hub = OrderHub::new(HubConfig::default(), transport.clone());
///
/// let customer = ConnectionId::from("customer");
/// let mut inbox = transport.attach(customer.clone()).await;
/// hub.on_connect(customer.clone(), None).await?;
///
/// let order_id = hub.submit_order("Americano", "Large").await?;
/// hub.watch_order_status(customer, order_id);
///
/// hub.shutdown().await?;
/// ```
pub struct OrderHub {
    /// Client for the connection registry actor
    pub registry: RegistryClient,

    /// Client for the order-book actor
    pub orders: OrderClient,

    dispatcher: Dispatcher,
    ingress: OrderIngress,
    watcher: OrderStatusWatcher,
    handlers: HandlerTable,
    shutdown: CancellationToken,
    sessions: TaskTracker,

    /// Task handles for the actors (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl OrderHub {
    /// Starts a hub whose watches read the built-in order book.
    pub fn new(config: HubConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, transport, None)
    }

    /// Starts a hub whose watches read `source` instead of the order book.
    ///
    /// Ingress still stores orders in the order book.
    pub fn with_status_source(
        config: HubConfig,
        transport: Arc<dyn Transport>,
        source: Arc<dyn OrderStatusSource>,
    ) -> Self {
        Self::build(config, transport, Some(source))
    }

    fn build(
        config: HubConfig,
        transport: Arc<dyn Transport>,
        source: Option<Arc<dyn OrderStatusSource>>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let sessions = TaskTracker::new();

        // 1. Create actors
        let (registry_actor, registry) =
            crate::registry_actor::new(config.actor_buffer_size, shutdown.clone());
        let (order_actor, orders) = crate::order_actor::new(config.actor_buffer_size);

        // 2. Start actors with injected context
        let pipeline = PreparationPipeline::with_stage_duration(config.stage_duration());
        let registry_handle = tokio::spawn(registry_actor.run());
        let order_handle = tokio::spawn(order_actor.run(OrderContext::new(pipeline)));

        // 3. Wire services on top of the clients
        let dispatcher = Dispatcher::new(registry.clone(), transport);
        let source: Arc<dyn OrderStatusSource> = match source {
            Some(source) => source,
            None => Arc::new(OrderBookStatusSource::new(orders.clone())),
        };
        let ingress = OrderIngress::new(orders.clone(), dispatcher.clone());
        let watcher = OrderStatusWatcher::new(
            registry.clone(),
            dispatcher.clone(),
            source,
            config.watch_settings(),
            sessions.clone(),
        );

        let mut handlers = HandlerTable::new();
        for method in [GET_UPDATE_FOR_ORDER, WATCH_ORDER_STATUS] {
            handlers.register(method, Arc::new(WatchOrderHandler::new(method, watcher.clone())));
        }

        info!(?config, "Hub started");
        Self {
            registry,
            orders,
            dispatcher,
            ingress,
            watcher,
            handlers,
            shutdown,
            sessions,
            handles: vec![registry_handle, order_handle],
        }
    }

    /// Admits a connection. Registering the same id twice changes nothing.
    pub async fn on_connect(
        &self,
        connection_id: ConnectionId,
        identity: Option<IdentityToken>,
    ) -> Result<bool, RegistryError> {
        self.registry.register(connection_id, identity).await
    }

    /// Drops a connection. Its watch sessions are cancelled before this returns.
    pub async fn on_disconnect(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<Departure>, RegistryError> {
        self.registry.unregister(connection_id).await
    }

    pub async fn join_group(
        &self,
        connection_id: ConnectionId,
        group: impl Into<String>,
    ) -> Result<MembershipChange, RegistryError> {
        self.registry.join_group(connection_id, group.into()).await
    }

    pub async fn leave_group(
        &self,
        connection_id: ConnectionId,
        group: impl Into<String>,
    ) -> Result<MembershipChange, RegistryError> {
        self.registry.leave_group(connection_id, group.into()).await
    }

    pub async fn members_of(
        &self,
        group: impl Into<String>,
    ) -> Result<HashSet<ConnectionId>, RegistryError> {
        self.registry.members_of(group.into()).await
    }

    /// Accepts an order and broadcasts `NewOrder` to every connection.
    pub async fn submit_order(
        &self,
        product: impl Into<String>,
        size: impl Into<String>,
    ) -> Result<OrderId, IngressError> {
        self.submit(OrderCreate::new(product, size))
            .await
            .map(|submission| submission.order.id)
    }

    /// Like [`submit_order`](Self::submit_order), also returning the broadcast report.
    pub async fn submit(&self, params: OrderCreate) -> Result<Submission, IngressError> {
        self.ingress.submit_order(params).await
    }

    /// Starts a watch session for `caller` on its own task.
    pub fn watch_order_status(
        &self,
        caller: ConnectionId,
        order_id: OrderId,
    ) -> JoinHandle<Result<WatchOutcome, WatchError>> {
        self.watcher.spawn(caller, order_id)
    }

    /// Routes an inbound method call from a connection.
    pub async fn invoke(
        &self,
        ctx: CallContext,
        method: &str,
        payload: Value,
    ) -> Result<Value, InvocationError> {
        self.handlers.invoke(ctx, method, payload).await
    }

    /// Sends any event to any target.
    pub async fn send(&self, target: Target, event: HubEvent) -> Result<DispatchReport, RegistryError> {
        self.dispatcher.send(target, event).await
    }

    /// The inbound methods this hub answers.
    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Gracefully shuts down the hub.
    ///
    /// 1. Cancels every watch session and waits for their tasks
    /// 2. Drops all clients, which closes the actors' channels
    /// 3. Waits for the actor tasks to complete
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down hub...");

        self.shutdown.cancel();
        self.sessions.close();
        self.sessions.wait().await;

        // Every remaining sender lives in these values
        drop(self.handlers);
        drop(self.watcher);
        drop(self.ingress);
        drop(self.dispatcher);
        drop(self.registry);
        drop(self.orders);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Hub shutdown complete.");
        Ok(())
    }
}
