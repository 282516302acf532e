//! Forwarding-chain principal records.

use crate::ids::WampId;

/// One hop in a `forward_for` chain.
///
/// Recorded when a router relays a message on behalf of another session
/// or router; the full chain lets the receiving end reconstruct the path
/// a forwarded message travelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Session the hop acted for.
    pub session: WampId,
    /// Authentication id of that session, if it had one.
    pub authid: Option<String>,
    /// Authentication role of that session.
    pub authrole: String,
}

impl Principal {
    pub fn new(session: WampId, authid: Option<String>, authrole: impl Into<String>) -> Self {
        Principal {
            session,
            authid,
            authrole: authrole.into(),
        }
    }
}
