use crate::handlers::{InvocationError, InvocationHandler};
use crate::model::{CallContext, OrderId};
use crate::watcher::OrderStatusWatcher;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Starts a watch session for the calling connection.
///
/// The reply `{"orderId": .., "accepted": true}` only means the request was
/// parsed and a session was spawned. The session runs on its own task, and
/// anything that ends it early (a duplicate watch, an unknown order) reaches
/// the caller as a `WatchFailed` event, never through this reply.
pub struct WatchOrderHandler {
    method: &'static str,
    watcher: OrderStatusWatcher,
}

impl WatchOrderHandler {
    pub fn new(method: &'static str, watcher: OrderStatusWatcher) -> Self {
        Self { method, watcher }
    }

    /// Accepts `7`, `"7"` or `{"orderId": 7}`.
    pub fn parse_order_id(&self, payload: &Value) -> Result<OrderId, InvocationError> {
        let raw = match payload {
            Value::Object(map) => map.get("orderId").unwrap_or(&Value::Null),
            other => other,
        };
        let id = match raw {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        id.map(OrderId).ok_or_else(|| InvocationError::InvalidPayload {
            method: self.method.to_string(),
            reason: format!("expected an order id, got {payload}"),
        })
    }
}

#[async_trait]
impl InvocationHandler for WatchOrderHandler {
    async fn handle(&self, ctx: CallContext, payload: Value) -> Result<Value, InvocationError> {
        let order_id = self.parse_order_id(&payload)?;
        drop(self.watcher.spawn(ctx.connection_id, order_id));
        Ok(json!({ "orderId": order_id, "accepted": true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::testing::{RecordingTransport, ScriptedStatusSource};
    use crate::watcher::WatchSettings;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tokio_util::task::TaskTracker;

    fn handler() -> WatchOrderHandler {
        let (actor, registry) = crate::registry_actor::new(4, CancellationToken::new());
        drop(actor);
        let dispatcher = Dispatcher::new(registry.clone(), Arc::new(RecordingTransport::new()));
        let watcher = OrderStatusWatcher::new(
            registry,
            dispatcher,
            Arc::new(ScriptedStatusSource::new()),
            WatchSettings::default(),
            TaskTracker::new(),
        );
        WatchOrderHandler::new("GetUpdateForOrder", watcher)
    }

    #[test]
    fn order_id_forms() {
        let h = handler();
        assert_eq!(h.parse_order_id(&json!(7)).unwrap(), OrderId(7));
        assert_eq!(h.parse_order_id(&json!("12")).unwrap(), OrderId(12));
        assert_eq!(h.parse_order_id(&json!({"orderId": 3})).unwrap(), OrderId(3));
        assert_eq!(h.parse_order_id(&json!({"orderId": "4"})).unwrap(), OrderId(4));
    }

    #[test]
    fn bad_order_ids_are_invalid_payload() {
        let h = handler();
        for bad in [json!("latte"), json!(-1), json!(1.5), json!(null), json!({})] {
            assert!(matches!(
                h.parse_order_id(&bad),
                Err(InvocationError::InvalidPayload { .. })
            ));
        }
    }
}
