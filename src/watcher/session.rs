//! The polling loop behind one watch invocation.

use crate::clients::RegistryClient;
use crate::dispatch::Dispatcher;
use crate::model::{
    CheckResult, ConnectionId, HubEvent, OrderId, StatusPayload, Target, WatchFailure,
};
use crate::registry_actor::WatchLease;
use crate::status::{OrderStatusSource, StatusSourceError};
use crate::watcher::{WatchError, WatchOutcome, WatchSettings};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchState {
    Polling,
    /// A fresh snapshot is about to be sent to the caller.
    Notifying(CheckResult),
    /// The session is done; the terminal event is still to be sent.
    Finished(WatchOutcome),
    Cancelled,
}

pub(crate) struct WatchSession {
    pub(crate) caller: ConnectionId,
    pub(crate) order_id: OrderId,
    pub(crate) source: Arc<dyn OrderStatusSource>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) settings: WatchSettings,
    pub(crate) registry: RegistryClient,
    pub(crate) lease: WatchLease,
}

impl WatchSession {
    /// Drives the state machine until it finishes or is cancelled.
    ///
    /// The lease is released right before the terminal event is sent, so the
    /// caller can start a new watch for the same order as soon as it sees it.
    pub(crate) async fn run(self) -> Result<WatchOutcome, WatchError> {
        let mut state = WatchState::Polling;
        let mut failures = 0u32;
        let mut updates = 0usize;
        let mut last_seen: Option<StatusPayload> = None;

        loop {
            if self.lease.token.is_cancelled() {
                state = WatchState::Cancelled;
            }

            state = match state {
                WatchState::Polling => match self
                    .source
                    .check_update(self.order_id, last_seen.as_ref())
                    .await
                {
                    Ok(snapshot) => {
                        failures = 0;
                        if snapshot.is_new {
                            WatchState::Notifying(snapshot)
                        } else if snapshot.finished {
                            WatchState::Finished(WatchOutcome::Completed { updates })
                        } else {
                            self.wait().await
                        }
                    }
                    Err(StatusSourceError::UnknownOrder(_)) => {
                        WatchState::Finished(WatchOutcome::Failed(WatchFailure::UnknownOrder))
                    }
                    Err(StatusSourceError::Unavailable(reason)) => {
                        failures += 1;
                        warn!(
                            order_id = %self.order_id,
                            failures,
                            %reason,
                            "Status check failed"
                        );
                        if failures >= self.settings.max_consecutive_failures {
                            WatchState::Finished(WatchOutcome::Failed(
                                WatchFailure::SourceUnavailable,
                            ))
                        } else {
                            self.wait().await
                        }
                    }
                },
                WatchState::Notifying(snapshot) => {
                    last_seen = Some(snapshot.update.clone());
                    self.notify(HubEvent::ReceiveOrderUpdate(snapshot.update))
                        .await?;
                    updates += 1;
                    if snapshot.finished {
                        WatchState::Finished(WatchOutcome::Completed { updates })
                    } else {
                        self.wait().await
                    }
                }
                WatchState::Finished(outcome) => {
                    self.release().await;
                    if self.lease.token.is_cancelled() {
                        debug!(order_id = %self.order_id, "Cancelled before terminal event");
                        return Ok(WatchOutcome::Cancelled);
                    }
                    let terminal = match outcome {
                        WatchOutcome::Failed(reason) => HubEvent::WatchFailed {
                            order_id: self.order_id,
                            reason,
                        },
                        _ => HubEvent::Finished,
                    };
                    self.notify(terminal).await?;
                    info!(
                        connection_id = %self.caller,
                        order_id = %self.order_id,
                        ?outcome,
                        "Watch finished"
                    );
                    return Ok(outcome);
                }
                WatchState::Cancelled => {
                    self.release().await;
                    info!(
                        connection_id = %self.caller,
                        order_id = %self.order_id,
                        updates,
                        "Watch cancelled"
                    );
                    return Ok(WatchOutcome::Cancelled);
                }
            };
        }
    }

    async fn release(&self) {
        let released = self
            .registry
            .end_watch(self.caller.clone(), self.order_id, self.lease.serial)
            .await;
        if let Err(e) = released {
            warn!(order_id = %self.order_id, error = %e, "Failed to release watch");
        }
    }

    // Sleeps one poll interval unless cancelled first.
    async fn wait(&self) -> WatchState {
        tokio::select! {
            _ = self.lease.token.cancelled() => WatchState::Cancelled,
            _ = tokio::time::sleep(self.settings.poll_interval) => WatchState::Polling,
        }
    }

    async fn notify(&self, event: HubEvent) -> Result<(), WatchError> {
        let report = self
            .dispatcher
            .send(Target::Caller(self.caller.clone()), event)
            .await?;
        if !report.all_delivered() {
            debug!(connection_id = %self.caller, "Caller did not receive event");
        }
        Ok(())
    }
}
