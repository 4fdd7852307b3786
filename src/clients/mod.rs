//! Type-safe wrappers around the hub's actors.
//!
//! Nothing outside this module sends raw actor messages; callers use
//! [`OrderClient`] for the order book and [`RegistryClient`] for connections.

pub mod actor_client;
pub mod order_client;
pub mod registry_client;

pub use actor_client::*;
pub use order_client::*;
pub use registry_client::*;
