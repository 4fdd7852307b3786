//! Runtime orchestration: configuration, tracing setup and the [`OrderHub`]
//! that starts, wires and stops every component.

pub mod config;
pub mod hub_system;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use config::*;
pub use hub_system::*;
