//! # Registry Actor
//!
//! Tracks live connections and named groups, and owns the cancellation tokens of
//! every watch session. Unlike the order book this actor is not a
//! [`ResourceActor`](crate::framework::ResourceActor): its operations are
//! relational (connection ↔ group) rather than per-entity, so it has its own
//! request enum and loop written in the same style.

mod actor;
mod error;
pub mod message;
mod state;

pub use actor::RegistryActor;
pub use error::RegistryError;
pub use state::{
    Departure, MembershipChange, RegistryState, RegistryStats, WatchLease, WatchRejection,
};

use crate::clients::RegistryClient;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Creates the registry actor and its client.
///
/// Watch sessions hang off `root`: cancelling it cancels all of them.
pub fn new(buffer_size: usize, root: CancellationToken) -> (RegistryActor, RegistryClient) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let actor = RegistryActor::new(receiver, RegistryState::new(root));
    (actor, RegistryClient::new(sender))
}
