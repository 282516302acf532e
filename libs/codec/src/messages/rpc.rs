//! RPC control messages: Register, Registered, Unregister, Unregistered,
//! Cancel, Interrupt, EventReceived.

use wamp_types::{
    CancelMode, Dict, InvocationPolicy, MatchPolicy, Principal, Uri, UriRules, Value, WampId,
};

use crate::error::{ProtocolError, ProtocolResult};
use crate::validation::{
    check_or_raise_extra, check_or_raise_id, check_or_raise_nonzero_id,
    check_or_raise_required_uri,
    OptionReader,
};

use super::common::{expect_length, marshal_forward_for};
use super::MessageType;

/// `[REGISTER, request|id, options|dict, procedure|uri]`
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    pub request: WampId,
    pub procedure: Uri,
    pub match_policy: MatchPolicy,
    pub invoke: InvocationPolicy,
    /// Maximum concurrent invocations the callee accepts; must be > 0.
    pub concurrency: Option<u64>,
    pub force_reregister: Option<bool>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Register {
    pub const NAME: &'static str = "REGISTER";

    pub fn new(request: WampId, procedure: Uri) -> Self {
        assert!(!request.is_zero(), "REGISTER.request must be a live id");
        Register {
            request,
            procedure,
            match_policy: MatchPolicy::Exact,
            invoke: InvocationPolicy::Single,
            concurrency: None,
            force_reregister: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: u64) -> Self {
        assert!(concurrency > 0, "REGISTER.concurrency must be positive");
        self.concurrency = Some(concurrency);
        self
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[4], "4")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let options = check_or_raise_extra(Self::NAME, "options", &wmsg[2])?;
        let reader = OptionReader::new(Self::NAME, &options);

        let match_policy = reader
            .enum_opt("match", MatchPolicy::from_str)?
            .unwrap_or_default();
        let procedure = check_or_raise_required_uri(
            Self::NAME,
            "procedure",
            &wmsg[3],
            match_policy.uri_rules(false),
        )?;

        Ok(Register {
            request,
            procedure,
            match_policy,
            invoke: reader
                .enum_opt("invoke", InvocationPolicy::from_str)?
                .unwrap_or_default(),
            concurrency: reader.positive_int_opt("concurrency")?,
            force_reregister: reader.bool_opt("force_reregister")?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&[
                "match",
                "invoke",
                "concurrency",
                "force_reregister",
                "forward_for",
            ]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut options = self.custom.clone();
        if self.match_policy != MatchPolicy::Exact {
            options.insert("match".into(), Value::from(self.match_policy.as_str()));
        }
        if self.invoke != InvocationPolicy::Single {
            options.insert("invoke".into(), Value::from(self.invoke.as_str()));
        }
        if let Some(concurrency) = self.concurrency {
            options.insert("concurrency".into(), Value::from(concurrency));
        }
        if let Some(force_reregister) = self.force_reregister {
            options.insert("force_reregister".into(), Value::Bool(force_reregister));
        }
        marshal_forward_for(&self.forward_for, &mut options);

        vec![
            Value::Integer(MessageType::Register as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(options),
            Value::from(self.procedure.as_str()),
        ]
    }
}

/// `[REGISTERED, request|id, registration|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    pub request: WampId,
    pub registration: WampId,
}

impl Registered {
    pub const NAME: &'static str = "REGISTERED";

    pub fn new(request: WampId, registration: WampId) -> Self {
        Registered {
            request,
            registration,
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        Ok(Registered {
            request: check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?,
            registration: check_or_raise_id(Self::NAME, "registration", &wmsg[2])?,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        vec![
            Value::Integer(MessageType::Registered as i64),
            Value::from(self.request.into_raw()),
            Value::from(self.registration.into_raw()),
        ]
    }
}

/// `[UNREGISTER, request|id, registration|id, options|dict?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Unregister {
    pub request: WampId,
    pub registration: WampId,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Unregister {
    pub const NAME: &'static str = "UNREGISTER";

    pub fn new(request: WampId, registration: WampId) -> Self {
        Unregister {
            request,
            registration,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3, 4], "3 or 4")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let registration = check_or_raise_id(Self::NAME, "registration", &wmsg[2])?;

        let (forward_for, custom) = if wmsg.len() == 4 {
            let options = check_or_raise_extra(Self::NAME, "options", &wmsg[3])?;
            let reader = OptionReader::new(Self::NAME, &options);
            (
                reader.forward_for_opt()?.unwrap_or_default(),
                reader.take_custom(&["forward_for"]),
            )
        } else {
            (Vec::new(), Dict::new())
        };

        Ok(Unregister {
            request,
            registration,
            forward_for,
            custom,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut wire = vec![
            Value::Integer(MessageType::Unregister as i64),
            Value::from(self.request.into_raw()),
            Value::from(self.registration.into_raw()),
        ];
        if !self.forward_for.is_empty() || !self.custom.is_empty() {
            let mut options = self.custom.clone();
            marshal_forward_for(&self.forward_for, &mut options);
            wire.push(Value::Dict(options));
        }
        wire
    }
}

/// `[UNREGISTERED, request|id, details|dict?]`
///
/// `request == 0` is the router-initiated revocation form and requires
/// `details.registration`; the plain reply form carries the original
/// request id and no details.
#[derive(Debug, Clone, PartialEq)]
pub struct Unregistered {
    pub request: WampId,
    pub registration: Option<WampId>,
    pub reason: Option<Uri>,
    pub custom: Dict,
}

impl Unregistered {
    pub const NAME: &'static str = "UNREGISTERED";

    pub fn reply(request: WampId) -> Self {
        assert!(!request.is_zero(), "reply form requires the original request id");
        Unregistered {
            request,
            registration: None,
            reason: None,
            custom: Dict::new(),
        }
    }

    pub fn revocation(registration: WampId, reason: Option<Uri>) -> Self {
        assert!(
            !registration.is_zero(),
            "revocation requires a non-zero registration id"
        );
        Unregistered {
            request: WampId::ZERO,
            registration: Some(registration),
            reason,
            custom: Dict::new(),
        }
    }

    fn assert_valid(&self) {
        if self.request.is_zero() {
            assert!(
                self.registration.is_some(),
                "router-initiated UNREGISTERED requires details.registration"
            );
        } else {
            assert!(
                self.registration.is_none() && self.reason.is_none(),
                "reply-form UNREGISTERED must not carry revocation details"
            );
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[2, 3], "2 or 3")?;
        let request = check_or_raise_id(Self::NAME, "request", &wmsg[1])?;

        let (registration, reason, custom) = if wmsg.len() == 3 {
            let details = check_or_raise_extra(Self::NAME, "details", &wmsg[2])?;
            let reader = OptionReader::new(Self::NAME, &details);
            let registration = match reader.id_opt("registration")? {
                Some(id) if id.is_zero() => {
                    return Err(ProtocolError::invalid_id(
                        Self::NAME,
                        "registration",
                        "revoked registration id must be non-zero",
                    ));
                }
                other => other,
            };
            (
                registration,
                reader.uri_opt("reason", UriRules::default())?,
                reader.take_custom(&["registration", "reason"]),
            )
        } else {
            (None, None, Dict::new())
        };

        if request.is_zero() && registration.is_none() {
            return Err(ProtocolError::missing_field(Self::NAME, "registration"));
        }
        if !request.is_zero() && registration.is_some() {
            return Err(ProtocolError::invalid_id(
                Self::NAME,
                "request",
                "revocation details require request == 0",
            ));
        }

        Ok(Unregistered {
            request,
            registration,
            reason,
            custom,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.assert_valid();
        let mut wire = vec![
            Value::Integer(MessageType::Unregistered as i64),
            Value::from(self.request.into_raw()),
        ];
        if self.registration.is_some() || self.reason.is_some() || !self.custom.is_empty() {
            let mut details = self.custom.clone();
            if let Some(registration) = self.registration {
                details.insert("registration".into(), Value::from(registration.into_raw()));
            }
            if let Some(reason) = &self.reason {
                details.insert("reason".into(), Value::from(reason.as_str()));
            }
            wire.push(Value::Dict(details));
        }
        wire
    }
}

/// `[CANCEL, request|id, options|dict]`
#[derive(Debug, Clone, PartialEq)]
pub struct Cancel {
    pub request: WampId,
    pub mode: Option<CancelMode>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Cancel {
    pub const NAME: &'static str = "CANCEL";

    pub fn new(request: WampId, mode: Option<CancelMode>) -> Self {
        assert!(!request.is_zero(), "CANCEL.request must be a live id");
        Cancel {
            request,
            mode,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let options = check_or_raise_extra(Self::NAME, "options", &wmsg[2])?;
        let reader = OptionReader::new(Self::NAME, &options);

        Ok(Cancel {
            request,
            mode: reader.enum_opt("mode", CancelMode::from_str)?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&["mode", "forward_for"]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut options = self.custom.clone();
        if let Some(mode) = self.mode {
            options.insert("mode".into(), Value::from(mode.as_str()));
        }
        marshal_forward_for(&self.forward_for, &mut options);

        vec![
            Value::Integer(MessageType::Cancel as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(options),
        ]
    }
}

/// `[INTERRUPT, request|id, options|dict]`
///
/// Dealer-to-callee counterpart of `Cancel`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interrupt {
    pub request: WampId,
    pub mode: Option<CancelMode>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Interrupt {
    pub const NAME: &'static str = "INTERRUPT";

    pub fn new(request: WampId, mode: Option<CancelMode>) -> Self {
        assert!(!request.is_zero(), "INTERRUPT.request must be a live id");
        Interrupt {
            request,
            mode,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let options = check_or_raise_extra(Self::NAME, "options", &wmsg[2])?;
        let reader = OptionReader::new(Self::NAME, &options);

        Ok(Interrupt {
            request,
            mode: reader.enum_opt("mode", CancelMode::from_str)?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&["mode", "forward_for"]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut options = self.custom.clone();
        if let Some(mode) = self.mode {
            options.insert("mode".into(), Value::from(mode.as_str()));
        }
        marshal_forward_for(&self.forward_for, &mut options);

        vec![
            Value::Integer(MessageType::Interrupt as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(options),
        ]
    }
}

/// `[EVENT_RECEIVED, publication|id]`
///
/// Subscriber acknowledgement of event delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EventReceived {
    pub publication: WampId,
}

impl EventReceived {
    pub const NAME: &'static str = "EVENT_RECEIVED";

    pub fn new(publication: WampId) -> Self {
        EventReceived { publication }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[2], "2")?;
        Ok(EventReceived {
            publication: check_or_raise_nonzero_id(Self::NAME, "publication", &wmsg[1])?,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        vec![
            Value::Integer(MessageType::EventReceived as i64),
            Value::from(self.publication.into_raw()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> WampId {
        WampId::try_new(raw).unwrap()
    }

    #[test]
    fn register_roundtrip_with_all_options() {
        let mut register = Register::new(id(25349185), Uri::unchecked("com.myapp.echo"))
            .with_concurrency(4);
        register.invoke = InvocationPolicy::RoundRobin;
        register.force_reregister = Some(true);
        let wire = register.marshal();
        assert_eq!(Register::parse(&wire).unwrap(), register);
    }

    #[test]
    fn register_rejects_zero_concurrency() {
        let wire = vec![
            Value::Integer(64),
            Value::Integer(1),
            Value::Dict([("concurrency".to_string(), Value::Integer(0))].into()),
            Value::from("com.myapp.echo"),
        ];
        assert!(Register::parse(&wire).is_err());
    }

    #[test]
    fn register_rejects_unknown_invoke_policy() {
        let wire = vec![
            Value::Integer(64),
            Value::Integer(1),
            Value::Dict([("invoke".to_string(), Value::from("sticky"))].into()),
            Value::from("com.myapp.echo"),
        ];
        assert!(Register::parse(&wire).is_err());
    }

    #[test]
    fn unregistered_revocation_roundtrips() {
        let revocation =
            Unregistered::revocation(id(77), Some(Uri::unchecked("wamp.close.normal")));
        let wire = revocation.marshal();
        assert_eq!(wire[1], Value::Integer(0));
        assert_eq!(Unregistered::parse(&wire).unwrap(), revocation);
    }

    #[test]
    fn unregistered_rejects_mixed_form() {
        let wire = vec![
            Value::Integer(67),
            Value::Integer(5),
            Value::Dict([("registration".to_string(), Value::Integer(77))].into()),
        ];
        assert!(Unregistered::parse(&wire).is_err());
    }

    #[test]
    fn cancel_mode_registry_enforced() {
        let cancel = Cancel::new(id(10), Some(CancelMode::KillNoWait));
        assert_eq!(Cancel::parse(&cancel.marshal()).unwrap(), cancel);

        let wire = vec![
            Value::Integer(49),
            Value::Integer(10),
            Value::Dict([("mode".to_string(), Value::from("pause"))].into()),
        ];
        assert!(Cancel::parse(&wire).is_err());
    }

    #[test]
    fn event_received_roundtrip() {
        let ack = EventReceived::new(id(4429313566));
        assert_eq!(EventReceived::parse(&ack.marshal()).unwrap(), ack);
    }
}
