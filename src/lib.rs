//! # Order Hub
//!
//! > **The real-time messaging core of a coffee-order notification service.**
//!
//! Clients connect over a messaging transport. When an order is submitted every
//! connection hears about it (`NewOrder`), and a client can ask to watch one
//! order: the hub then polls its status and streams `ReceiveOrderUpdate`
//! events to that client alone, ending with `Finished` (or `WatchFailed`).
//!
//! ## Core Concepts
//!
//! ### Actors own the state
//! The connection registry and the order book each run in their own Tokio task
//! and process requests sequentially, so neither needs a lock. The order book
//! is a generic [`ResourceActor`](framework::ResourceActor); the registry has
//! its own loop written the same way.
//!
//! ### Sessions are tasks
//! Every watch is an independent task holding a cancellation token issued by
//! the registry. Disconnecting a connection cancels its tokens before the call
//! returns, and a session never sends anything after it observes the cancel.
//!
//! ### Context is explicit
//! Inbound calls carry a [`CallContext`](model::CallContext) with the
//! connection id and the opaque identity handed over by the transport.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Generic `ResourceActor<T>` / `ResourceClient<T>` and the
//! [`MockClient`](framework::mock::MockClient) used to test clients without
//! spawning actors.
//!
//! ### 2. The Actors ([`registry_actor`], [`order_actor`])
//! Connections and groups; accepted orders and their simulated preparation.
//!
//! ### 3. The Interface ([`clients`])
//! [`RegistryClient`](clients::RegistryClient) and
//! [`OrderClient`](clients::OrderClient) hide message passing from the rest of
//! the crate.
//!
//! ### 4. The Protocol ([`dispatch`], [`watcher`], [`ingress`], [`handlers`])
//! Target resolution and fan-out, the per-order polling state machine, order
//! submission and the inbound method table.
//!
//! ### 5. The Seams ([`transport`], [`status`])
//! Traits for delivering events and reading order status, with in-process
//! implementations. [`testing`] has recording/scripted doubles for both.
//!
//! ### 6. The Orchestrator ([`lifecycle`])
//! [`OrderHub`](lifecycle::OrderHub) starts and wires everything;
//! [`HubConfig`](lifecycle::HubConfig) reads `ORDER_HUB_*` variables.
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod dispatch;
pub mod framework;
pub mod handlers;
pub mod ingress;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod registry_actor;
pub mod status;
pub mod testing;
pub mod transport;
pub mod watcher;
