//! Custom actions for the Order actor.
//!
//! Orders are never updated in place; the only operation beyond create/get is
//! reading a status snapshot from the
//! [`PreparationPipeline`](super::PreparationPipeline).

use crate::model::StatusPayload;

/// Custom actions for Order entities.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    /// Reads the order's status relative to what the reader last saw.
    CheckUpdate { last_seen: Option<StatusPayload> },
}
