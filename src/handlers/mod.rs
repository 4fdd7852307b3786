//! Inbound invocations: a table from method name to handler.

pub mod watch_order;

pub use watch_order::WatchOrderHandler;

use crate::model::CallContext;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Method names the hub answers to for starting a watch.
pub const GET_UPDATE_FOR_ORDER: &str = "GetUpdateForOrder";
pub const WATCH_ORDER_STATUS: &str = "WatchOrderStatus";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid payload for {method}: {reason}")]
    InvalidPayload { method: String, reason: String },
}

/// Handles one inbound method.
#[async_trait]
pub trait InvocationHandler: Send + Sync {
    async fn handle(&self, ctx: CallContext, payload: Value) -> Result<Value, InvocationError>;
}

#[derive(Default, Clone)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn InvocationHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `method`, replacing any previous one.
    pub fn register(&mut self, method: impl Into<String>, handler: Arc<dyn InvocationHandler>) {
        self.handlers.insert(method.into(), handler);
    }

    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    /// Routes an invocation to its handler.
    pub async fn invoke(
        &self,
        ctx: CallContext,
        method: &str,
        payload: Value,
    ) -> Result<Value, InvocationError> {
        let Some(handler) = self.handlers.get(method) else {
            warn!(connection_id = %ctx.connection_id, method, "Unknown method");
            return Err(InvocationError::UnknownMethod(method.to_string()));
        };
        debug!(connection_id = %ctx.connection_id, method, "Invoke");
        handler.handle(ctx, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl InvocationHandler for Echo {
        async fn handle(&self, ctx: CallContext, payload: Value) -> Result<Value, InvocationError> {
            Ok(json!({ "from": ctx.connection_id, "payload": payload }))
        }
    }

    #[tokio::test]
    async fn routes_by_method_name() {
        let mut table = HandlerTable::new();
        table.register("Echo", Arc::new(Echo));

        let reply = table
            .invoke(CallContext::new("conn_1"), "Echo", json!(5))
            .await
            .unwrap();
        assert_eq!(reply, json!({ "from": "conn_1", "payload": 5 }));
        assert_eq!(table.methods(), vec!["Echo"]);
    }

    #[tokio::test]
    async fn unknown_method_is_an_error() {
        let table = HandlerTable::new();
        let result = table
            .invoke(CallContext::new("conn_1"), "Nope", Value::Null)
            .await;
        assert_eq!(result, Err(InvocationError::UnknownMethod("Nope".into())));
    }
}
