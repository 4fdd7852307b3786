//! # Registry Client
//!
//! High-level API for the connection registry actor.
use crate::framework::{FrameworkError, Response};
use crate::model::{ConnectionId, IdentityToken, OrderId, Target};
use crate::registry_actor::message::RegistryRequest;
use crate::registry_actor::{Departure, MembershipChange, RegistryError, RegistryStats, WatchLease};
use std::collections::HashSet;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Client for interacting with the registry actor. Cheap to clone.
#[derive(Clone)]
pub struct RegistryClient {
    sender: mpsc::Sender<RegistryRequest>,
}

impl RegistryClient {
    pub fn new(sender: mpsc::Sender<RegistryRequest>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> RegistryRequest,
    ) -> Result<R, RegistryError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| Self::map_error(FrameworkError::ActorClosed))?;
        response
            .await
            .map_err(|_| Self::map_error(FrameworkError::ActorDropped))?
            .map_err(Self::map_error)
    }

    fn map_error(e: FrameworkError) -> RegistryError {
        match e {
            FrameworkError::EntityError(inner) => match inner.downcast::<RegistryError>() {
                Ok(registry_error) => *registry_error,
                Err(other) => RegistryError::ActorCommunicationError(other.to_string()),
            },
            other => RegistryError::ActorCommunicationError(other.to_string()),
        }
    }

    /// Registers a connection. Returns `false` if it was already registered.
    #[instrument(skip(self, identity))]
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        identity: Option<IdentityToken>,
    ) -> Result<bool, RegistryError> {
        debug!("Sending register to actor");
        self.request(|respond_to| RegistryRequest::Register {
            connection_id,
            identity,
            respond_to,
        })
        .await
    }

    /// Removes a connection, its memberships and its watch sessions.
    #[instrument(skip(self))]
    pub async fn unregister(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<Departure>, RegistryError> {
        debug!("Sending unregister to actor");
        self.request(|respond_to| RegistryRequest::Unregister {
            connection_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn join_group(
        &self,
        connection_id: ConnectionId,
        group: String,
    ) -> Result<MembershipChange, RegistryError> {
        self.request(|respond_to| RegistryRequest::JoinGroup {
            connection_id,
            group,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn leave_group(
        &self,
        connection_id: ConnectionId,
        group: String,
    ) -> Result<MembershipChange, RegistryError> {
        self.request(|respond_to| RegistryRequest::LeaveGroup {
            connection_id,
            group,
            respond_to,
        })
        .await
    }

    pub async fn members_of(&self, group: String) -> Result<HashSet<ConnectionId>, RegistryError> {
        self.request(|respond_to| RegistryRequest::MembersOf { group, respond_to })
            .await
    }

    /// Resolves a target to the connections registered at this instant.
    pub async fn resolve(&self, target: Target) -> Result<Vec<ConnectionId>, RegistryError> {
        self.request(|respond_to| RegistryRequest::Resolve { target, respond_to })
            .await
    }

    /// Claims the `(connection, order)` watch slot.
    #[instrument(skip(self))]
    pub async fn begin_watch(
        &self,
        connection_id: ConnectionId,
        order_id: OrderId,
    ) -> Result<WatchLease, RegistryError> {
        self.request(|respond_to| RegistryRequest::BeginWatch {
            connection_id,
            order_id,
            respond_to,
        })
        .await?
    }

    /// Releases a watch slot previously claimed with `serial`.
    pub async fn end_watch(
        &self,
        connection_id: ConnectionId,
        order_id: OrderId,
        serial: u64,
    ) -> Result<bool, RegistryError> {
        self.request(|respond_to| RegistryRequest::EndWatch {
            connection_id,
            order_id,
            serial,
            respond_to,
        })
        .await
    }

    pub async fn identity_of(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<IdentityToken>, RegistryError> {
        self.request(|respond_to| RegistryRequest::Identity {
            connection_id,
            respond_to,
        })
        .await
    }

    pub async fn stats(&self) -> Result<RegistryStats, RegistryError> {
        self.request(|respond_to| RegistryRequest::Stats { respond_to })
            .await
    }
}
