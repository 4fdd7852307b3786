//! Events delivered from the hub to connected clients.
use crate::model::{Order, OrderId, StatusPayload};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const NEW_ORDER: &str = "NewOrder";
pub const RECEIVE_ORDER_UPDATE: &str = "ReceiveOrderUpdate";
pub const FINISHED: &str = "Finished";
pub const WATCH_FAILED: &str = "WatchFailed";

/// Why a watch ended without reaching `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchFailure {
    UnknownOrder,
    SourceUnavailable,
    AlreadyWatching,
}

impl Display for WatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WatchFailure::UnknownOrder => "unknown order",
            WatchFailure::SourceUnavailable => "status source unavailable",
            WatchFailure::AlreadyWatching => "already watching this order",
        };
        f.write_str(s)
    }
}

/// An outbound event: a client-side method name plus its structured arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// Broadcast when ingress accepts an order.
    NewOrder(Order),
    /// A status change for a watched order.
    ReceiveOrderUpdate(StatusPayload),
    /// Terminal event of a watch that ran to completion.
    Finished,
    /// Terminal event of a watch that could not complete.
    WatchFailed { order_id: OrderId, reason: WatchFailure },
    /// Any other event, addressed by name.
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

impl HubEvent {
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        HubEvent::Custom {
            name: name.into(),
            payload,
        }
    }

    /// The client-side method this event invokes.
    pub fn name(&self) -> &str {
        match self {
            HubEvent::NewOrder(_) => NEW_ORDER,
            HubEvent::ReceiveOrderUpdate(_) => RECEIVE_ORDER_UPDATE,
            HubEvent::Finished => FINISHED,
            HubEvent::WatchFailed { .. } => WATCH_FAILED,
            HubEvent::Custom { name, .. } => name,
        }
    }

    /// Whether this event ends a watch stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, HubEvent::Finished | HubEvent::WatchFailed { .. })
    }

    /// Lowers the event into an invocation message ready for a wire codec.
    pub fn to_message(&self) -> Result<OutboundMessage, serde_json::Error> {
        let arguments = match self {
            HubEvent::NewOrder(order) => vec![serde_json::to_value(order)?],
            HubEvent::ReceiveOrderUpdate(update) => vec![update.clone()],
            HubEvent::Finished => Vec::new(),
            HubEvent::WatchFailed { order_id, reason } => vec![serde_json::json!({
                "orderId": order_id,
                "reason": reason,
            })],
            HubEvent::Custom { payload, .. } => vec![payload.clone()],
        };
        Ok(OutboundMessage {
            target: self.name().to_string(),
            arguments,
        })
    }
}

/// Structured form of an outbound invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub target: String,
    pub arguments: Vec<serde_json::Value>,
}
