//! Addressing modes for outbound events.
use crate::model::ConnectionId;
use std::fmt::Display;

/// Who an outbound event is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Every registered connection.
    All,
    /// The connection that made the current call.
    Caller(ConnectionId),
    /// Every registered connection except one.
    AllExcept(ConnectionId),
    /// One specific connection.
    Client(ConnectionId),
    /// Every member of a group.
    Group(String),
}

impl Target {
    pub fn group(name: impl Into<String>) -> Self {
        Target::Group(name.into())
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::All => f.write_str("all"),
            Target::Caller(id) => write!(f, "caller:{id}"),
            Target::AllExcept(id) => write!(f, "all-except:{id}"),
            Target::Client(id) => write!(f, "client:{id}"),
            Target::Group(name) => write!(f, "group:{name}"),
        }
    }
}
