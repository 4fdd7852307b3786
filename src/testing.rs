//! Test doubles for the hub's collaborator traits.
//!
//! [`ScriptedStatusSource`] plays back a queue of snapshots per order and
//! [`RecordingTransport`] records every delivery. Both are usable from unit
//! tests and from the integration tests under `tests/`.

use crate::model::{CheckResult, ConnectionId, HubEvent, OrderId, StatusPayload};
use crate::status::{OrderStatusSource, StatusSourceError};
use crate::transport::{DeliveryError, Transport};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Result<CheckResult, StatusSourceError>>,
    last: Option<Result<CheckResult, StatusSourceError>>,
    polls: usize,
}

/// Status source that replays scripted results.
///
/// Orders without a script are unknown. Once a script runs out, its final
/// entry is repeated. The caller's last-seen status is ignored.
#[derive(Default)]
pub struct ScriptedStatusSource {
    scripts: Mutex<HashMap<OrderId, Script>>,
}

impl ScriptedStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot to the order's script.
    pub fn push(&self, order_id: OrderId, snapshot: CheckResult) -> &Self {
        self.push_result(order_id, Ok(snapshot))
    }

    /// Appends a transient failure to the order's script.
    pub fn push_failure(&self, order_id: OrderId, reason: &str) -> &Self {
        self.push_result(
            order_id,
            Err(StatusSourceError::Unavailable(reason.to_string())),
        )
    }

    pub fn push_result(
        &self,
        order_id: OrderId,
        result: Result<CheckResult, StatusSourceError>,
    ) -> &Self {
        lock(&self.scripts)
            .entry(order_id)
            .or_default()
            .steps
            .push_back(result);
        self
    }

    /// How many times `order_id` has been polled.
    pub fn polls(&self, order_id: OrderId) -> usize {
        lock(&self.scripts).get(&order_id).map_or(0, |s| s.polls)
    }
}

#[async_trait]
impl OrderStatusSource for ScriptedStatusSource {
    async fn check_update(
        &self,
        order_id: OrderId,
        _last_seen: Option<&StatusPayload>,
    ) -> Result<CheckResult, StatusSourceError> {
        let mut scripts = lock(&self.scripts);
        let script = scripts
            .get_mut(&order_id)
            .ok_or(StatusSourceError::UnknownOrder(order_id))?;
        script.polls += 1;

        if let Some(step) = script.steps.pop_front() {
            script.last = Some(step.clone());
            return step;
        }
        script.last.clone().unwrap_or(Err(StatusSourceError::Unavailable(
            "empty script".to_string(),
        )))
    }
}

/// Transport that records deliveries instead of sending them.
#[derive(Default)]
pub struct RecordingTransport {
    deliveries: Mutex<Vec<(ConnectionId, HubEvent)>>,
    failing: Mutex<HashSet<ConnectionId>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future delivery to `connection_id` fail with `ConnectionGone`.
    pub fn fail_for(&self, connection_id: ConnectionId) {
        lock(&self.failing).insert(connection_id);
    }

    /// Every successful delivery, in the order they happened.
    pub fn deliveries(&self) -> Vec<(ConnectionId, HubEvent)> {
        lock(&self.deliveries).clone()
    }

    pub fn events_for(&self, connection_id: &ConnectionId) -> Vec<HubEvent> {
        lock(&self.deliveries)
            .iter()
            .filter(|(id, _)| id == connection_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Event names delivered to `connection_id`, in order.
    pub fn event_names_for(&self, connection_id: &ConnectionId) -> Vec<String> {
        self.events_for(connection_id)
            .iter()
            .map(|event| event.name().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(
        &self,
        connection_id: &ConnectionId,
        event: &HubEvent,
    ) -> Result<(), DeliveryError> {
        if lock(&self.failing).contains(connection_id) {
            return Err(DeliveryError::ConnectionGone(connection_id.clone()));
        }
        lock(&self.deliveries).push((connection_id.clone(), event.clone()));
        Ok(())
    }
}
