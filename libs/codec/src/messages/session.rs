//! Session lifecycle messages: Hello, Welcome, Abort, Challenge,
//! Authenticate, Goodbye.
//!
//! These carry no application payload and no forwarding chain; their
//! interesting validation is the role-announcement maps whose key sets
//! are fixed by the protocol.

use wamp_types::{
    ClientRole, ClientRoleMap, Dict, RoleFeatures, RouterRole, RouterRoleMap, Uri, UriRules,
    Value, WampId,
};

use crate::error::{ProtocolError, ProtocolResult};
use crate::validation::{
    check_or_raise_extra, check_or_raise_id, check_or_raise_required_uri, check_or_raise_string,
    check_or_raise_uri,
    OptionReader,
};

use super::common::expect_length;

/// URI reserved for orderly session close.
pub const CLOSE_NORMAL: &str = "wamp.close.normal";

fn parse_client_roles(message: &'static str, value: &Value) -> ProtocolResult<ClientRoleMap> {
    let map = match value {
        Value::Dict(map) => map,
        other => return Err(ProtocolError::invalid_field(message, "roles", other)),
    };
    if map.is_empty() {
        return Err(ProtocolError::missing_field(message, "roles"));
    }

    let mut roles = ClientRoleMap::new();
    for (name, record) in map {
        let role = ClientRole::from_str(name).ok_or_else(|| {
            ProtocolError::invalid_field(message, "roles", &Value::from(name.as_str()))
        })?;
        roles.insert(role, parse_role_features(message, record)?);
    }
    Ok(roles)
}

fn parse_router_roles(message: &'static str, value: &Value) -> ProtocolResult<RouterRoleMap> {
    let map = match value {
        Value::Dict(map) => map,
        other => return Err(ProtocolError::invalid_field(message, "roles", other)),
    };
    if map.is_empty() {
        return Err(ProtocolError::missing_field(message, "roles"));
    }

    let mut roles = RouterRoleMap::new();
    for (name, record) in map {
        let role = RouterRole::from_str(name).ok_or_else(|| {
            ProtocolError::invalid_field(message, "roles", &Value::from(name.as_str()))
        })?;
        roles.insert(role, parse_role_features(message, record)?);
    }
    Ok(roles)
}

fn parse_role_features(message: &'static str, record: &Value) -> ProtocolResult<RoleFeatures> {
    let record = match record {
        Value::Dict(map) => map,
        other => return Err(ProtocolError::invalid_field(message, "roles", other)),
    };
    match record.get("features") {
        None => Ok(RoleFeatures::default()),
        Some(Value::Dict(features)) => Ok(RoleFeatures::new(features.clone())),
        Some(other) => Err(ProtocolError::invalid_field(message, "roles", other)),
    }
}

fn marshal_role_features(features: &RoleFeatures) -> Value {
    let mut record = Dict::new();
    if !features.is_empty() {
        record.insert("features".into(), Value::Dict(features.features.clone()));
    }
    Value::Dict(record)
}

/// `[HELLO, realm|uri-or-null, details|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Hello {
    /// Realm to join; `None` asks the router to pick one (anonymous).
    pub realm: Option<Uri>,
    pub roles: ClientRoleMap,
    pub authmethods: Option<Vec<String>>,
    pub authid: Option<String>,
    pub authrole: Option<String>,
    pub authextra: Option<Dict>,
    pub resumable: Option<bool>,
    /// `x_*` extension keys preserved verbatim.
    pub custom: Dict,
}

impl Hello {
    pub const NAME: &'static str = "HELLO";

    pub fn new(realm: Option<Uri>, roles: ClientRoleMap) -> Self {
        assert!(!roles.is_empty(), "HELLO must announce at least one role");
        Hello {
            realm,
            roles,
            authmethods: None,
            authid: None,
            authrole: None,
            authextra: None,
            resumable: None,
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        let realm =
            check_or_raise_uri(Self::NAME, "realm", &wmsg[1], UriRules::default(), true)?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[2])?;
        let reader = OptionReader::new(Self::NAME, &details);

        let roles = parse_client_roles(
            Self::NAME,
            reader
                .get("roles")
                .ok_or_else(|| ProtocolError::missing_field(Self::NAME, "roles"))?,
        )?;

        Ok(Hello {
            realm,
            roles,
            authmethods: reader.string_list_opt("authmethods")?,
            authid: reader.string_opt("authid")?,
            authrole: reader.string_opt("authrole")?,
            authextra: reader.dict_opt("authextra")?,
            resumable: reader.bool_opt("resumable")?,
            custom: reader.take_custom(&[
                "roles",
                "authmethods",
                "authid",
                "authrole",
                "authextra",
                "resumable",
            ]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut details = self.custom.clone();
        let mut roles = Dict::new();
        for (role, features) in &self.roles {
            roles.insert(role.as_str().into(), marshal_role_features(features));
        }
        details.insert("roles".into(), Value::Dict(roles));
        if let Some(authmethods) = &self.authmethods {
            details.insert(
                "authmethods".into(),
                Value::List(authmethods.iter().map(|m| Value::from(m.as_str())).collect()),
            );
        }
        if let Some(authid) = &self.authid {
            details.insert("authid".into(), Value::from(authid.as_str()));
        }
        if let Some(authrole) = &self.authrole {
            details.insert("authrole".into(), Value::from(authrole.as_str()));
        }
        if let Some(authextra) = &self.authextra {
            details.insert("authextra".into(), Value::Dict(authextra.clone()));
        }
        if let Some(resumable) = self.resumable {
            details.insert("resumable".into(), Value::Bool(resumable));
        }

        let realm = match &self.realm {
            Some(uri) => Value::from(uri.as_str()),
            None => Value::Null,
        };
        vec![
            Value::Integer(super::MessageType::Hello as i64),
            realm,
            Value::Dict(details),
        ]
    }
}

/// `[WELCOME, session|id, details|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Welcome {
    pub session: WampId,
    pub roles: RouterRoleMap,
    pub realm: Option<Uri>,
    pub authid: Option<String>,
    pub authrole: Option<String>,
    pub authmethod: Option<String>,
    pub authprovider: Option<String>,
    pub authextra: Option<Dict>,
    pub custom: Dict,
}

impl Welcome {
    pub const NAME: &'static str = "WELCOME";

    pub fn new(session: WampId, roles: RouterRoleMap) -> Self {
        assert!(!roles.is_empty(), "WELCOME must announce at least one role");
        Welcome {
            session,
            roles,
            realm: None,
            authid: None,
            authrole: None,
            authmethod: None,
            authprovider: None,
            authextra: None,
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        let session = check_or_raise_id(Self::NAME, "session", &wmsg[1])?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[2])?;
        let reader = OptionReader::new(Self::NAME, &details);

        let roles = parse_router_roles(
            Self::NAME,
            reader
                .get("roles")
                .ok_or_else(|| ProtocolError::missing_field(Self::NAME, "roles"))?,
        )?;

        Ok(Welcome {
            session,
            roles,
            realm: reader.uri_opt("realm", UriRules::default())?,
            authid: reader.string_opt("authid")?,
            authrole: reader.string_opt("authrole")?,
            authmethod: reader.string_opt("authmethod")?,
            authprovider: reader.string_opt("authprovider")?,
            authextra: reader.dict_opt("authextra")?,
            custom: reader.take_custom(&[
                "roles",
                "realm",
                "authid",
                "authrole",
                "authmethod",
                "authprovider",
                "authextra",
            ]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut details = self.custom.clone();
        let mut roles = Dict::new();
        for (role, features) in &self.roles {
            roles.insert(role.as_str().into(), marshal_role_features(features));
        }
        details.insert("roles".into(), Value::Dict(roles));
        if let Some(realm) = &self.realm {
            details.insert("realm".into(), Value::from(realm.as_str()));
        }
        if let Some(authid) = &self.authid {
            details.insert("authid".into(), Value::from(authid.as_str()));
        }
        if let Some(authrole) = &self.authrole {
            details.insert("authrole".into(), Value::from(authrole.as_str()));
        }
        if let Some(authmethod) = &self.authmethod {
            details.insert("authmethod".into(), Value::from(authmethod.as_str()));
        }
        if let Some(authprovider) = &self.authprovider {
            details.insert("authprovider".into(), Value::from(authprovider.as_str()));
        }
        if let Some(authextra) = &self.authextra {
            details.insert("authextra".into(), Value::Dict(authextra.clone()));
        }

        vec![
            Value::Integer(super::MessageType::Welcome as i64),
            Value::from(self.session.into_raw()),
            Value::Dict(details),
        ]
    }
}

/// `[ABORT, details|dict, reason|uri]`
#[derive(Debug, Clone, PartialEq)]
pub struct Abort {
    pub reason: Uri,
    /// Optional human-readable `details.message`.
    pub message: Option<String>,
    pub custom: Dict,
}

impl Abort {
    pub const NAME: &'static str = "ABORT";

    pub fn new(reason: Uri) -> Self {
        Abort {
            reason,
            message: None,
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[1])?;
        let reader = OptionReader::new(Self::NAME, &details);
        let reason =
            check_or_raise_required_uri(Self::NAME, "reason", &wmsg[2], UriRules::default())?;

        Ok(Abort {
            reason,
            message: reader.string_opt("message")?,
            custom: reader.take_custom(&["message"]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut details = self.custom.clone();
        if let Some(message) = &self.message {
            details.insert("message".into(), Value::from(message.as_str()));
        }
        vec![
            Value::Integer(super::MessageType::Abort as i64),
            Value::Dict(details),
            Value::from(self.reason.as_str()),
        ]
    }
}

/// `[CHALLENGE, method|string, extra|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    /// Authentication method name (e.g. `wampcra`, `cryptosign`); the
    /// algorithms themselves live outside this crate.
    pub method: String,
    pub extra: Dict,
}

impl Challenge {
    pub const NAME: &'static str = "CHALLENGE";

    pub fn new(method: impl Into<String>, extra: Dict) -> Self {
        Challenge {
            method: method.into(),
            extra,
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        Ok(Challenge {
            method: check_or_raise_string(Self::NAME, "method", &wmsg[1])?,
            extra: check_or_raise_extra(Self::NAME, "extra", &wmsg[2])?,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        vec![
            Value::Integer(super::MessageType::Challenge as i64),
            Value::from(self.method.as_str()),
            Value::Dict(self.extra.clone()),
        ]
    }
}

/// `[AUTHENTICATE, signature|string, extra|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticate {
    pub signature: String,
    pub extra: Dict,
}

impl Authenticate {
    pub const NAME: &'static str = "AUTHENTICATE";

    pub fn new(signature: impl Into<String>, extra: Dict) -> Self {
        Authenticate {
            signature: signature.into(),
            extra,
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        Ok(Authenticate {
            signature: check_or_raise_string(Self::NAME, "signature", &wmsg[1])?,
            extra: check_or_raise_extra(Self::NAME, "extra", &wmsg[2])?,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        vec![
            Value::Integer(super::MessageType::Authenticate as i64),
            Value::from(self.signature.as_str()),
            Value::Dict(self.extra.clone()),
        ]
    }
}

/// `[GOODBYE, details|dict, reason|uri]`
#[derive(Debug, Clone, PartialEq)]
pub struct Goodbye {
    pub reason: Uri,
    pub message: Option<String>,
    pub custom: Dict,
}

impl Goodbye {
    pub const NAME: &'static str = "GOODBYE";

    /// Orderly close with the default `wamp.close.normal` reason.
    pub fn normal() -> Self {
        Goodbye {
            reason: Uri::unchecked(CLOSE_NORMAL),
            message: None,
            custom: Dict::new(),
        }
    }

    pub fn with_reason(reason: Uri) -> Self {
        Goodbye {
            reason,
            message: None,
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[1])?;
        let reader = OptionReader::new(Self::NAME, &details);
        let reason =
            check_or_raise_required_uri(Self::NAME, "reason", &wmsg[2], UriRules::default())?;

        Ok(Goodbye {
            reason,
            message: reader.string_opt("message")?,
            custom: reader.take_custom(&["message"]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut details = self.custom.clone();
        if let Some(message) = &self.message {
            details.insert("message".into(), Value::from(message.as_str()));
        }
        vec![
            Value::Integer(super::MessageType::Goodbye as i64),
            Value::Dict(details),
            Value::from(self.reason.as_str()),
        ]
    }
}
