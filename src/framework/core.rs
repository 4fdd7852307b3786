//! # Core Actor Framework
//!
//! This module defines the generic building blocks the hub uses for its stateful
//! services.
//!
//! ## Key Types
//!
//! - [`ActorEntity`]: The trait that every resource kept by an actor must implement.
//! - [`ResourceActor`]: The generic actor that owns a store of entities.
//! - [`ResourceClient`]: The generic client for communicating with actors.
//! - [`FrameworkError`]: Common errors (e.g., ActorClosed, NotFound).

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Trait that any resource entity must implement to be managed by [`ResourceActor`].
///
/// # Architecture Note
/// By defining a contract (`ActorEntity`) that resource types must satisfy, the
/// `ResourceActor` message loop is written *once* and reused for every resource.
///
/// Associated types enforce type safety: an `Order` requires an `OrderCreate`
/// payload, and the compiler rejects anything else.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they may await other actors. The `Context` type is
/// injected into every hook at `run()` time ("late binding").
///
/// Resources managed this way are append-only: there is no update or delete path.
/// State changes happen exclusively through [`ActorEntity::handle_action`].
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance (DTO - Data Transfer Object).
    type Create: Send + Sync + Debug;

    /// Enum representing resource-specific operations (e.g., `CheckUpdate`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies or settings) injected into the actor.
    /// Use `()` if nothing is needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the ID and payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called immediately after the entity is constructed, before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler (Async) ---

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to a [`ResourceActor`].
///
/// - **Create**: Uses [`ActorEntity::Create`] to initialize a new resource.
/// - **Get**: Fetches the current state of the resource by ID.
/// - **Action**: Executes a custom [`ActorEntity::Action`] against one resource.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that manages a collection of entities.
///
/// This struct is the "Server" half of the actor. It owns the state (`store`) and
/// the receiver end of the channel. Messages are processed sequentially, so the
/// store needs no `Mutex`.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `next_id_fn` is called once per `Create` request, including ones that fail.
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    pub async fn run(mut self, context: T::Context) {
        // Extract just the type name (e.g., "Order" instead of "order_hub::model::order::Order")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = (self.next_id_fn)();

                    match T::from_create_params(id.clone(), params) {
                        Ok(mut item) => {
                            if let Err(e) = item.on_create(&context).await {
                                warn!(entity_type, error = %e, "on_create failed");
                                let _ =
                                    respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                                continue;
                            }
                            self.store.insert(id.clone(), item);
                            info!(entity_type, %id, size = self.store.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    if let Some(item) = self.store.get_mut(&id) {
                        let result = item
                            .handle_action(action, &context)
                            .await
                            .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                        match &result {
                            Ok(_) => debug!(entity_type, %id, "Action ok"),
                            Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                        }
                        let _ = respond_to.send(result);
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe client for interacting with a `ResourceActor`.
///
/// Holds only a sender, so cloning is cheap.
#[derive(Clone)]
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Create { params, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Get { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Action {
                id,
                action,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        id: u64,
        label: String,
        hits: u32,
    }

    #[derive(Debug)]
    struct CounterCreate {
        label: String,
    }

    #[derive(Debug)]
    enum CounterAction {
        Hit,
        Reject,
    }

    #[derive(Debug, thiserror::Error)]
    enum CounterError {
        #[error("label must not be empty")]
        EmptyLabel,
        #[error("rejected")]
        Rejected,
    }

    #[async_trait]
    impl ActorEntity for Counter {
        type Id = u64;
        type Create = CounterCreate;
        type Action = CounterAction;
        type ActionResult = u32;
        type Context = u32;
        type Error = CounterError;

        fn from_create_params(id: u64, params: CounterCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                label: params.label,
                hits: 0,
            })
        }

        async fn on_create(&mut self, _ctx: &u32) -> Result<(), Self::Error> {
            if self.label.is_empty() {
                return Err(CounterError::EmptyLabel);
            }
            Ok(())
        }

        async fn handle_action(
            &mut self,
            action: CounterAction,
            step: &u32,
        ) -> Result<u32, Self::Error> {
            match action {
                CounterAction::Hit => {
                    self.hits += step;
                    Ok(self.hits)
                }
                CounterAction::Reject => Err(CounterError::Rejected),
            }
        }
    }

    fn spawn_counter_actor() -> ResourceClient<Counter> {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || counter.fetch_add(1, Ordering::SeqCst);
        let (actor, client) = ResourceActor::new(10, next_id);
        tokio::spawn(actor.run(5));
        client
    }

    #[tokio::test]
    async fn test_resource_actor_create_get_and_action() {
        let client = spawn_counter_actor();

        let id = client
            .create(CounterCreate {
                label: "espresso".into(),
            })
            .await
            .unwrap();
        assert_eq!(id, 1);

        // Context is injected into every action
        assert_eq!(client.perform_action(id, CounterAction::Hit).await.unwrap(), 5);
        assert_eq!(client.perform_action(id, CounterAction::Hit).await.unwrap(), 10);

        let stored = client.get(id).await.unwrap().unwrap();
        assert_eq!(stored.label, "espresso");
        assert_eq!(stored.hits, 10);
    }

    #[tokio::test]
    async fn test_on_create_failure_is_not_stored() {
        let client = spawn_counter_actor();

        let result = client.create(CounterCreate { label: String::new() }).await;
        assert!(matches!(result, Err(FrameworkError::EntityError(_))));

        // The id was consumed but nothing was stored under it
        assert!(client.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_action_on_missing_entity_is_not_found() {
        let client = spawn_counter_actor();

        let result = client.perform_action(42, CounterAction::Hit).await;
        assert!(matches!(result, Err(FrameworkError::NotFound(id)) if id == "42"));
    }

    #[tokio::test]
    async fn test_action_error_is_wrapped() {
        let client = spawn_counter_actor();
        let id = client
            .create(CounterCreate { label: "latte".into() })
            .await
            .unwrap();

        let result = client.perform_action(id, CounterAction::Reject).await;
        match result {
            Err(FrameworkError::EntityError(e)) => assert_eq!(e.to_string(), "rejected"),
            other => panic!("expected EntityError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_actor_reports_actor_closed() {
        let (actor, client) = ResourceActor::<Counter>::new(4, || 1);
        drop(actor);

        let result = client.get(1).await;
        assert!(matches!(result, Err(FrameworkError::ActorClosed)));
    }
}
