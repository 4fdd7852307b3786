//! Generic actor framework for the hub's stateful services.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that resource types implement to be kept by an actor
//! - [`ResourceActor`] - Generic actor that owns the entities
//! - [`ResourceClient`] - Type-safe handle for sending requests to the actor
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning full actors.

pub mod core;
pub mod mock;

pub use self::core::*;
