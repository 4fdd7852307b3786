//! # Order Status Watcher
//!
//! One watch invocation = one [`WatchSession`](session::WatchSession) running
//! on its own task. The session polls an [`OrderStatusSource`], streams
//! `ReceiveOrderUpdate` to the caller only, and ends with exactly one terminal
//! event (`Finished` or `WatchFailed`) unless the caller disconnects first.
//!
//! ```text
//!            ┌──────── not new, not finished (wait) ───────┐
//!            ▼                                              │
//!   ──▶ Polling ── new ──▶ Notifying ── !finished (wait) ──▶ Polling
//!        │  │                  │
//!        │  └─ finished ──┐    └─ finished ──┐
//!        │                ▼                  ▼
//!        │             Finished ◀────────────┘
//!        └─ cancel ──▶ Cancelled (from any state)
//! ```

pub mod session;

pub use session::WatchState;

use crate::clients::RegistryClient;
use crate::dispatch::Dispatcher;
use crate::model::{ConnectionId, HubEvent, OrderId, Target, WatchFailure};
use crate::registry_actor::RegistryError;
use crate::status::OrderStatusSource;
use session::WatchSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{info, instrument, warn};

/// How a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The order finished; `updates` is the number of `ReceiveOrderUpdate`s sent.
    Completed { updates: usize },
    /// A `WatchFailed` event was sent.
    Failed(WatchFailure),
    /// The connection went away; nothing more was sent.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WatchError {
    #[error("Registry unavailable: {0}")]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    /// Consecutive source failures tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            max_consecutive_failures: 3,
        }
    }
}

/// Starts watch sessions. Cheap to clone.
#[derive(Clone)]
pub struct OrderStatusWatcher {
    registry: RegistryClient,
    dispatcher: Dispatcher,
    source: Arc<dyn OrderStatusSource>,
    settings: WatchSettings,
    tracker: TaskTracker,
}

impl OrderStatusWatcher {
    pub fn new(
        registry: RegistryClient,
        dispatcher: Dispatcher,
        source: Arc<dyn OrderStatusSource>,
        settings: WatchSettings,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            source,
            settings,
            tracker,
        }
    }

    /// Runs a watch for `caller` on the current task until it ends.
    ///
    /// A second watch for the same `(caller, order)` pair is rejected with a
    /// `WatchFailed { AlreadyWatching }` event; the running one is untouched.
    #[instrument(skip(self, caller), fields(connection_id = %caller))]
    pub async fn watch(
        &self,
        caller: ConnectionId,
        order_id: OrderId,
    ) -> Result<WatchOutcome, WatchError> {
        let lease = match self.registry.begin_watch(caller.clone(), order_id).await {
            Ok(lease) => lease,
            Err(RegistryError::AlreadyWatching { .. }) => {
                let reason = WatchFailure::AlreadyWatching;
                self.dispatcher
                    .send(
                        Target::Caller(caller),
                        HubEvent::WatchFailed { order_id, reason },
                    )
                    .await?;
                return Ok(WatchOutcome::Failed(reason));
            }
            Err(RegistryError::NotConnected(_)) => {
                warn!("Watch requested by unregistered connection");
                return Ok(WatchOutcome::Cancelled);
            }
            Err(e) => return Err(e.into()),
        };

        info!(serial = lease.serial, "Watch started");
        WatchSession {
            caller,
            order_id,
            source: Arc::clone(&self.source),
            dispatcher: self.dispatcher.clone(),
            settings: self.settings,
            registry: self.registry.clone(),
            lease,
        }
        .run()
        .await
    }

    /// Spawns [`watch`](Self::watch) on its own task, tracked for shutdown.
    pub fn spawn(
        &self,
        caller: ConnectionId,
        order_id: OrderId,
    ) -> JoinHandle<Result<WatchOutcome, WatchError>> {
        let watcher = self.clone();
        self.tracker
            .spawn(async move { watcher.watch(caller, order_id).await })
    }
}
