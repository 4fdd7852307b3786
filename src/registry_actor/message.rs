//! Messages understood by the registry actor.
use crate::framework::Response;
use crate::model::{ConnectionId, IdentityToken, OrderId, Target};
use crate::registry_actor::{Departure, MembershipChange, RegistryError, RegistryStats, WatchLease};
use std::collections::HashSet;

#[derive(Debug)]
pub enum RegistryRequest {
    Register {
        connection_id: ConnectionId,
        identity: Option<IdentityToken>,
        respond_to: Response<bool>,
    },
    Unregister {
        connection_id: ConnectionId,
        respond_to: Response<Option<Departure>>,
    },
    JoinGroup {
        connection_id: ConnectionId,
        group: String,
        respond_to: Response<MembershipChange>,
    },
    LeaveGroup {
        connection_id: ConnectionId,
        group: String,
        respond_to: Response<MembershipChange>,
    },
    MembersOf {
        group: String,
        respond_to: Response<HashSet<ConnectionId>>,
    },
    Resolve {
        target: Target,
        respond_to: Response<Vec<ConnectionId>>,
    },
    BeginWatch {
        connection_id: ConnectionId,
        order_id: OrderId,
        respond_to: Response<Result<WatchLease, RegistryError>>,
    },
    EndWatch {
        connection_id: ConnectionId,
        order_id: OrderId,
        serial: u64,
        respond_to: Response<bool>,
    },
    Identity {
        connection_id: ConnectionId,
        respond_to: Response<Option<IdentityToken>>,
    },
    Stats {
        respond_to: Response<RegistryStats>,
    },
}
