//! Connection identity types.
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of one live client session.
///
/// Ids are normally assigned by the transport; [`ConnectionId::generate`] is
/// available for transports that do not have their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocates a process-unique id of the form `conn_<n>`.
    pub fn generate() -> Self {
        let n = NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed);
        Self(format!("conn_{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Already-authenticated identity handed over by the transport.
///
/// The hub never inspects it; it is carried along so handlers can make their
/// own decisions (e.g. which groups to join).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentityToken(..)")
    }
}

/// Explicit per-call context passed to every inbound invocation.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub connection_id: ConnectionId,
    pub identity: Option<IdentityToken>,
}

impl CallContext {
    pub fn new(connection_id: impl Into<ConnectionId>) -> Self {
        Self {
            connection_id: connection_id.into(),
            identity: None,
        }
    }

    pub fn with_identity(mut self, identity: IdentityToken) -> Self {
        self.identity = Some(identity);
        self
    }
}
