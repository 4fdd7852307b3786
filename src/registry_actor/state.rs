//! Connection and group bookkeeping owned by the registry actor.
//!
//! [`RegistryState`] is plain data: it is only ever touched from inside the
//! registry actor's loop, so none of it is locked.

use crate::model::{ConnectionId, IdentityToken, OrderId, Target};
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio_util::sync::CancellationToken;

/// Result of a group membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Joined,
    AlreadyMember,
    Left,
    NotMember,
    /// The connection is not registered; nothing changed.
    UnknownConnection,
}

/// Why a watch session could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchRejection {
    NotConnected,
    AlreadyWatching,
}

/// Handle for one running watch session.
///
/// `token` is cancelled when the owning connection unregisters or the hub shuts
/// down. `serial` identifies this lease when it is released.
#[derive(Debug, Clone)]
pub struct WatchLease {
    pub token: CancellationToken,
    pub serial: u64,
}

/// What a connection left behind when it was unregistered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub groups: Vec<String>,
    pub cancelled_watches: Vec<OrderId>,
}

/// Point-in-time counts for introspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub connections: usize,
    pub groups: usize,
    pub watches: usize,
}

struct ConnectionEntry {
    identity: Option<IdentityToken>,
    groups: BTreeSet<String>,
    cancel: CancellationToken,
    watches: HashMap<OrderId, WatchLease>,
}

/// Live connections, their group memberships and their watch sessions.
pub struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    groups: HashMap<String, HashSet<ConnectionId>>,
    root: CancellationToken,
    next_serial: u64,
}

impl RegistryState {
    /// Every connection token is a child of `root`; cancelling it ends all sessions.
    pub fn new(root: CancellationToken) -> Self {
        Self {
            connections: HashMap::new(),
            groups: HashMap::new(),
            root,
            next_serial: 1,
        }
    }

    /// Adds a connection. Returns `false` (and changes nothing) if it already exists.
    pub fn register(&mut self, id: ConnectionId, identity: Option<IdentityToken>) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections.insert(
            id,
            ConnectionEntry {
                identity,
                groups: BTreeSet::new(),
                cancel: self.root.child_token(),
                watches: HashMap::new(),
            },
        );
        true
    }

    /// Removes a connection and its memberships, cancelling its watch sessions
    /// before returning.
    pub fn unregister(&mut self, id: &ConnectionId) -> Option<Departure> {
        let entry = self.connections.remove(id)?;
        entry.cancel.cancel();

        for group in &entry.groups {
            self.remove_member(group, id);
        }

        let mut cancelled_watches: Vec<OrderId> = entry.watches.into_keys().collect();
        cancelled_watches.sort();
        Some(Departure {
            groups: entry.groups.into_iter().collect(),
            cancelled_watches,
        })
    }

    pub fn join_group(&mut self, id: &ConnectionId, group: &str) -> MembershipChange {
        let Some(entry) = self.connections.get_mut(id) else {
            return MembershipChange::UnknownConnection;
        };
        if !entry.groups.insert(group.to_string()) {
            return MembershipChange::AlreadyMember;
        }
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(id.clone());
        MembershipChange::Joined
    }

    pub fn leave_group(&mut self, id: &ConnectionId, group: &str) -> MembershipChange {
        let Some(entry) = self.connections.get_mut(id) else {
            return MembershipChange::UnknownConnection;
        };
        if !entry.groups.remove(group) {
            return MembershipChange::NotMember;
        }
        self.remove_member(group, id);
        MembershipChange::Left
    }

    // Drops the group entry once its last member is gone.
    fn remove_member(&mut self, group: &str, id: &ConnectionId) {
        if let Some(members) = self.groups.get_mut(group) {
            members.remove(id);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    /// Members of a group; empty if the group does not exist.
    pub fn members_of(&self, group: &str) -> HashSet<ConnectionId> {
        self.groups.get(group).cloned().unwrap_or_default()
    }

    /// Resolves a target to the registered connections it addresses.
    ///
    /// `Caller` and `Client` resolve to nothing when the id is not registered.
    pub fn resolve(&self, target: &Target) -> Vec<ConnectionId> {
        match target {
            Target::All => self.connections.keys().cloned().collect(),
            Target::AllExcept(excluded) => self
                .connections
                .keys()
                .filter(|id| *id != excluded)
                .cloned()
                .collect(),
            Target::Caller(id) | Target::Client(id) => {
                if self.connections.contains_key(id) {
                    vec![id.clone()]
                } else {
                    Vec::new()
                }
            }
            Target::Group(name) => self
                .groups
                .get(name)
                .map(|members| members.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Starts tracking a watch for `(id, order_id)`; at most one per pair.
    pub fn begin_watch(
        &mut self,
        id: &ConnectionId,
        order_id: OrderId,
    ) -> Result<WatchLease, WatchRejection> {
        let entry = self
            .connections
            .get_mut(id)
            .ok_or(WatchRejection::NotConnected)?;
        if entry.watches.contains_key(&order_id) {
            return Err(WatchRejection::AlreadyWatching);
        }

        let lease = WatchLease {
            token: entry.cancel.child_token(),
            serial: self.next_serial,
        };
        self.next_serial += 1;
        entry.watches.insert(order_id, lease.clone());
        Ok(lease)
    }

    /// Releases a watch. Stale serials are ignored.
    pub fn end_watch(&mut self, id: &ConnectionId, order_id: OrderId, serial: u64) -> bool {
        let Some(entry) = self.connections.get_mut(id) else {
            return false;
        };
        match entry.watches.get(&order_id) {
            Some(lease) if lease.serial == serial => {
                entry.watches.remove(&order_id);
                true
            }
            _ => false,
        }
    }

    pub fn identity_of(&self, id: &ConnectionId) -> Option<IdentityToken> {
        self.connections.get(id).and_then(|e| e.identity.clone())
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            connections: self.connections.len(),
            groups: self.groups.len(),
            watches: self.connections.values().map(|e| e.watches.len()).sum(),
        }
    }
}
