//! Pure data structures shared by every component of the hub.
//!
//! - [`connection`]: connection ids, identity tokens and the per-call context.
//! - [`order`]: the [`Order`] record kept by the order book.
//! - [`status`]: status snapshots produced by an order status source.
//! - [`event`]: the events the hub delivers to clients.
//! - [`target`]: addressing modes for those events.

pub mod connection;
pub mod event;
pub mod order;
pub mod status;
pub mod target;

pub use connection::*;
pub use event::*;
pub use order::*;
pub use status::*;
pub use target::*;
