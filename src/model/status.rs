//! Status snapshots produced by an [`OrderStatusSource`](crate::status::OrderStatusSource).
use serde::{Deserialize, Serialize};

/// The update value streamed to a watching client.
///
/// Kept as a structured value; encoding happens at the transport boundary.
pub type StatusPayload = serde_json::Value;

/// One point-in-time read of an order's processing status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// The status changed since the previous read.
    pub is_new: bool,
    pub update: StatusPayload,
    /// No further changes will follow.
    pub finished: bool,
}

impl CheckResult {
    pub fn new(is_new: bool, update: impl Into<StatusPayload>, finished: bool) -> Self {
        Self {
            is_new,
            update: update.into(),
            finished,
        }
    }

    /// A snapshot reporting a fresh status.
    pub fn changed(update: impl Into<StatusPayload>) -> Self {
        Self::new(true, update, false)
    }

    /// A snapshot reporting nothing new.
    pub fn unchanged(update: impl Into<StatusPayload>) -> Self {
        Self::new(false, update, false)
    }

    /// A fresh status that is also the last one.
    pub fn completed(update: impl Into<StatusPayload>) -> Self {
        Self::new(true, update, true)
    }
}
