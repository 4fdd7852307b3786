//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered
//! by `RUST_LOG`. Module paths are hidden (`with_target(false)`); log lines
//! carry structured fields such as `connection_id`, `order_id` and `group`
//! instead.
//!
//! ## What Gets Traced
//!
//! - **Actor lifecycle**: start and shutdown of the registry and order book.
//! - **Connections**: connect, disconnect, group joins and leaves.
//! - **Watches**: start, every failed status check, finish or cancellation.
//! - **Deliveries**: each failed delivery at `warn`, with the connection id.
//!
//! ```bash
//! # Lifecycle only
//! RUST_LOG=info cargo run
//!
//! # Every request, resolve and payload
//! RUST_LOG=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a full watch reads roughly as:
//!
//! ```text
//! INFO Connected connection_id=customer connections=2
//! INFO submit_order: Order accepted order_id=1
//! INFO watch: Watch started serial=1
//! INFO watch: Watch finished connection_id=customer order_id=1 outcome=Completed { updates: 5 }
//! ```

/// Installs the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
