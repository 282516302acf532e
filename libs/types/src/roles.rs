//! Role announcements exchanged during session establishment.
//!
//! `Hello` announces the client-side roles a peer implements, `Welcome`
//! answers with the router-side roles. The role-name sets are fixed by
//! the protocol; each role maps to an open feature record.

use std::collections::BTreeMap;
use std::fmt;

use crate::value::Dict;

/// Roles a client may announce in `Hello`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClientRole {
    Subscriber,
    Publisher,
    Caller,
    Callee,
}

impl ClientRole {
    pub const ALL: [ClientRole; 4] = [
        ClientRole::Subscriber,
        ClientRole::Publisher,
        ClientRole::Caller,
        ClientRole::Callee,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClientRole::Subscriber => "subscriber",
            ClientRole::Publisher => "publisher",
            ClientRole::Caller => "caller",
            ClientRole::Callee => "callee",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "subscriber" => Some(ClientRole::Subscriber),
            "publisher" => Some(ClientRole::Publisher),
            "caller" => Some(ClientRole::Caller),
            "callee" => Some(ClientRole::Callee),
            _ => None,
        }
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles a router may announce in `Welcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouterRole {
    Broker,
    Dealer,
}

impl RouterRole {
    pub const ALL: [RouterRole; 2] = [RouterRole::Broker, RouterRole::Dealer];

    pub fn as_str(self) -> &'static str {
        match self {
            RouterRole::Broker => "broker",
            RouterRole::Dealer => "dealer",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "broker" => Some(RouterRole::Broker),
            "dealer" => Some(RouterRole::Dealer),
            _ => None,
        }
    }
}

impl fmt::Display for RouterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature record attached to a role announcement.
///
/// Features are advisory key/value pairs (`{"features": {...}}` on the
/// wire); unknown features are carried verbatim rather than rejected so
/// newer peers can talk to older ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoleFeatures {
    pub features: Dict,
}

impl RoleFeatures {
    pub fn new(features: Dict) -> Self {
        RoleFeatures { features }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Role map carried in `Hello.details.roles`.
pub type ClientRoleMap = BTreeMap<ClientRole, RoleFeatures>;

/// Role map carried in `Welcome.details.roles`.
pub type RouterRoleMap = BTreeMap<RouterRole, RoleFeatures>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_roundtrip() {
        for role in ClientRole::ALL {
            assert_eq!(ClientRole::from_str(role.as_str()), Some(role));
        }
        for role in RouterRole::ALL {
            assert_eq!(RouterRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(ClientRole::from_str("broker"), None);
        assert_eq!(RouterRole::from_str("caller"), None);
    }
}
