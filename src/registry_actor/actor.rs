use crate::model::ConnectionId;
use crate::registry_actor::message::RegistryRequest;
use crate::registry_actor::{MembershipChange, RegistryError, RegistryState, WatchRejection};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns the [`RegistryState`] and applies requests to it one at a time.
///
/// Every mutation happens inside [`RegistryActor::run`], so a delivery that
/// resolves a target always sees a consistent snapshot of memberships.
pub struct RegistryActor {
    receiver: mpsc::Receiver<RegistryRequest>,
    state: RegistryState,
}

impl RegistryActor {
    pub(crate) fn new(receiver: mpsc::Receiver<RegistryRequest>, state: RegistryState) -> Self {
        Self { receiver, state }
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self) {
        info!("Registry started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RegistryRequest::Register {
                    connection_id,
                    identity,
                    respond_to,
                } => {
                    let added = self.state.register(connection_id.clone(), identity);
                    if added {
                        info!(%connection_id, connections = self.state.stats().connections, "Connected");
                    } else {
                        debug!(%connection_id, "Already registered");
                    }
                    let _ = respond_to.send(Ok(added));
                }
                RegistryRequest::Unregister {
                    connection_id,
                    respond_to,
                } => {
                    let departure = self.state.unregister(&connection_id);
                    match &departure {
                        Some(d) => info!(
                            %connection_id,
                            groups = d.groups.len(),
                            cancelled = d.cancelled_watches.len(),
                            "Disconnected"
                        ),
                        None => debug!(%connection_id, "Unregister for unknown connection"),
                    }
                    let _ = respond_to.send(Ok(departure));
                }
                RegistryRequest::JoinGroup {
                    connection_id,
                    group,
                    respond_to,
                } => {
                    let change = self.state.join_group(&connection_id, &group);
                    log_membership(&connection_id, &group, change);
                    let _ = respond_to.send(Ok(change));
                }
                RegistryRequest::LeaveGroup {
                    connection_id,
                    group,
                    respond_to,
                } => {
                    let change = self.state.leave_group(&connection_id, &group);
                    log_membership(&connection_id, &group, change);
                    let _ = respond_to.send(Ok(change));
                }
                RegistryRequest::MembersOf { group, respond_to } => {
                    let _ = respond_to.send(Ok(self.state.members_of(&group)));
                }
                RegistryRequest::Resolve { target, respond_to } => {
                    let recipients = self.state.resolve(&target);
                    debug!(%target, recipients = recipients.len(), "Resolve");
                    let _ = respond_to.send(Ok(recipients));
                }
                RegistryRequest::BeginWatch {
                    connection_id,
                    order_id,
                    respond_to,
                } => {
                    let result = self
                        .state
                        .begin_watch(&connection_id, order_id)
                        .map_err(|rejection| match rejection {
                            WatchRejection::NotConnected => {
                                RegistryError::NotConnected(connection_id.clone())
                            }
                            WatchRejection::AlreadyWatching => RegistryError::AlreadyWatching {
                                connection_id: connection_id.clone(),
                                order_id,
                            },
                        });
                    match &result {
                        Ok(lease) => debug!(%connection_id, %order_id, serial = lease.serial, "Watch started"),
                        Err(e) => warn!(%connection_id, %order_id, error = %e, "Watch rejected"),
                    }
                    let _ = respond_to.send(Ok(result));
                }
                RegistryRequest::EndWatch {
                    connection_id,
                    order_id,
                    serial,
                    respond_to,
                } => {
                    let released = self.state.end_watch(&connection_id, order_id, serial);
                    debug!(%connection_id, %order_id, released, "Watch ended");
                    let _ = respond_to.send(Ok(released));
                }
                RegistryRequest::Identity {
                    connection_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(Ok(self.state.identity_of(&connection_id)));
                }
                RegistryRequest::Stats { respond_to } => {
                    let _ = respond_to.send(Ok(self.state.stats()));
                }
            }
        }

        let stats = self.state.stats();
        info!(
            connections = stats.connections,
            groups = stats.groups,
            "Registry shutdown"
        );
    }
}

fn log_membership(connection_id: &ConnectionId, group: &str, change: MembershipChange) {
    match change {
        MembershipChange::Joined => info!(%connection_id, group, "Joined group"),
        MembershipChange::Left => info!(%connection_id, group, "Left group"),
        MembershipChange::AlreadyMember | MembershipChange::NotMember => {
            debug!(%connection_id, group, ?change, "Membership unchanged")
        }
        MembershipChange::UnknownConnection => {
            warn!(%connection_id, group, "Membership change for unknown connection ignored")
        }
    }
}
