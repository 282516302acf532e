//! Data-plane messages: the seven types that carry an application
//! payload (Error, Publish, Event, Call, Result, Invocation, Yield).
//!
//! All of them embed [`AppPayload`] for the trailing args/kwargs/opaque
//! slots and accept a `forward_for` chain in their options/details map,
//! so the payload and forwarding rules live once in
//! [`super::common`] and each type here only owns its positional fields
//! and recognized option keys.

use wamp_types::{Dict, Principal, Uri, UriRules, Value, WampId};

use crate::error::{ProtocolError, ProtocolResult};
use crate::validation::{
    check_or_raise_extra, check_or_raise_id, check_or_raise_nonzero_id,
    check_or_raise_required_uri,
    OptionReader,
};

use super::common::{expect_length, marshal_forward_for, AppPayload};
use super::MessageType;

/// Type codes allowed in `ERROR.request_type`: only the request-bearing
/// message types can fail with an ERROR reply.
const ERROR_REQUEST_TYPES: [MessageType; 7] = [
    MessageType::Subscribe,
    MessageType::Unsubscribe,
    MessageType::Publish,
    MessageType::Register,
    MessageType::Unregister,
    MessageType::Call,
    MessageType::Invocation,
];

/// `[ERROR, request_type|int, request|id, details|dict, error|uri, args?, kwargs?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub request_type: MessageType,
    pub request: WampId,
    pub error: Uri,
    pub payload: AppPayload,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Error {
    pub const NAME: &'static str = "ERROR";

    pub fn new(
        request_type: MessageType,
        request: WampId,
        error: Uri,
        payload: AppPayload,
    ) -> Self {
        assert!(
            ERROR_REQUEST_TYPES.contains(&request_type),
            "ERROR.request_type must be a request-bearing type code"
        );
        payload.assert_valid();
        Error {
            request_type,
            request,
            error,
            payload,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[5, 6, 7], "5, 6 or 7")?;

        let request_type = match &wmsg[1] {
            value @ (Value::Integer(_) | Value::UInteger(_)) => {
                let raw = value
                    .as_u64()
                    .ok_or_else(|| ProtocolError::invalid_field(Self::NAME, "request_type", value))?;
                let code = u8::try_from(raw)
                    .ok()
                    .and_then(|code| MessageType::try_from(code).ok())
                    .ok_or_else(|| ProtocolError::invalid_field(Self::NAME, "request_type", value))?;
                if !ERROR_REQUEST_TYPES.contains(&code) {
                    return Err(ProtocolError::invalid_field(Self::NAME, "request_type", value));
                }
                code
            }
            other => return Err(ProtocolError::invalid_field(Self::NAME, "request_type", other)),
        };

        let request = check_or_raise_id(Self::NAME, "request", &wmsg[2])?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[3])?;
        let error =
            check_or_raise_required_uri(Self::NAME, "error", &wmsg[4], UriRules::default())?;

        let reader = OptionReader::new(Self::NAME, &details);
        let payload = AppPayload::parse(Self::NAME, &wmsg[5..], &reader)?;

        Ok(Error {
            request_type,
            request,
            error,
            payload,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&["forward_for", "enc_algo", "enc_key", "enc_serializer"]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.payload.assert_valid();
        let mut details = self.custom.clone();
        marshal_forward_for(&self.forward_for, &mut details);

        let mut tail = Vec::new();
        self.payload.marshal_into(&mut tail, &mut details);

        let mut wire = vec![
            Value::Integer(MessageType::Error as i64),
            Value::Integer(self.request_type as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(details),
            Value::from(self.error.as_str()),
        ];
        wire.extend(tail);
        wire
    }
}

/// `[PUBLISH, request|id, options|dict, topic|uri, args?, kwargs?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Publish {
    pub request: WampId,
    pub topic: Uri,
    pub payload: AppPayload,
    pub acknowledge: Option<bool>,
    pub exclude_me: Option<bool>,
    pub exclude: Option<Vec<WampId>>,
    pub exclude_authid: Option<Vec<String>>,
    pub exclude_authrole: Option<Vec<String>>,
    pub eligible: Option<Vec<WampId>>,
    pub eligible_authid: Option<Vec<String>>,
    pub eligible_authrole: Option<Vec<String>>,
    pub retain: Option<bool>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Publish {
    pub const NAME: &'static str = "PUBLISH";

    const RECOGNIZED: [&'static str; 13] = [
        "acknowledge",
        "exclude_me",
        "exclude",
        "exclude_authid",
        "exclude_authrole",
        "eligible",
        "eligible_authid",
        "eligible_authrole",
        "retain",
        "forward_for",
        "enc_algo",
        "enc_key",
        "enc_serializer",
    ];

    pub fn new(request: WampId, topic: Uri, payload: AppPayload) -> Self {
        assert!(!request.is_zero(), "PUBLISH.request must be a live id");
        payload.assert_valid();
        Publish {
            request,
            topic,
            payload,
            acknowledge: None,
            exclude_me: None,
            exclude: None,
            exclude_authid: None,
            exclude_authrole: None,
            eligible: None,
            eligible_authid: None,
            eligible_authrole: None,
            retain: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[4, 5, 6], "4, 5 or 6")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let options = check_or_raise_extra(Self::NAME, "options", &wmsg[2])?;
        let topic =
            check_or_raise_required_uri(Self::NAME, "topic", &wmsg[3], UriRules::default())?;

        let reader = OptionReader::new(Self::NAME, &options);
        let payload = AppPayload::parse(Self::NAME, &wmsg[4..], &reader)?;

        Ok(Publish {
            request,
            topic,
            payload,
            acknowledge: reader.bool_opt("acknowledge")?,
            exclude_me: reader.bool_opt("exclude_me")?,
            exclude: reader.id_list_opt("exclude")?,
            exclude_authid: reader.string_list_opt("exclude_authid")?,
            exclude_authrole: reader.string_list_opt("exclude_authrole")?,
            eligible: reader.id_list_opt("eligible")?,
            eligible_authid: reader.string_list_opt("eligible_authid")?,
            eligible_authrole: reader.string_list_opt("eligible_authrole")?,
            retain: reader.bool_opt("retain")?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&Self::RECOGNIZED),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.payload.assert_valid();
        let mut options = self.custom.clone();
        if let Some(acknowledge) = self.acknowledge {
            options.insert("acknowledge".into(), Value::Bool(acknowledge));
        }
        if let Some(exclude_me) = self.exclude_me {
            options.insert("exclude_me".into(), Value::Bool(exclude_me));
        }
        if let Some(exclude) = &self.exclude {
            options.insert("exclude".into(), id_list(exclude));
        }
        if let Some(exclude_authid) = &self.exclude_authid {
            options.insert("exclude_authid".into(), string_list(exclude_authid));
        }
        if let Some(exclude_authrole) = &self.exclude_authrole {
            options.insert("exclude_authrole".into(), string_list(exclude_authrole));
        }
        if let Some(eligible) = &self.eligible {
            options.insert("eligible".into(), id_list(eligible));
        }
        if let Some(eligible_authid) = &self.eligible_authid {
            options.insert("eligible_authid".into(), string_list(eligible_authid));
        }
        if let Some(eligible_authrole) = &self.eligible_authrole {
            options.insert("eligible_authrole".into(), string_list(eligible_authrole));
        }
        if let Some(retain) = self.retain {
            options.insert("retain".into(), Value::Bool(retain));
        }
        marshal_forward_for(&self.forward_for, &mut options);

        let mut tail = Vec::new();
        self.payload.marshal_into(&mut tail, &mut options);

        let mut wire = vec![
            Value::Integer(MessageType::Publish as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(options),
            Value::from(self.topic.as_str()),
        ];
        wire.extend(tail);
        wire
    }
}

/// `[EVENT, subscription|id, publication|id, details|dict, args?, kwargs?]`
///
/// The details slot is always present on the wire, even when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub subscription: WampId,
    pub publication: WampId,
    pub payload: AppPayload,
    pub publisher: Option<WampId>,
    pub publisher_authid: Option<String>,
    pub publisher_authrole: Option<String>,
    pub topic: Option<Uri>,
    pub retained: Option<bool>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Event {
    pub const NAME: &'static str = "EVENT";

    const RECOGNIZED: [&'static str; 9] = [
        "publisher",
        "publisher_authid",
        "publisher_authrole",
        "topic",
        "retained",
        "forward_for",
        "enc_algo",
        "enc_key",
        "enc_serializer",
    ];

    pub fn new(subscription: WampId, publication: WampId, payload: AppPayload) -> Self {
        assert!(!subscription.is_zero(), "EVENT.subscription must be a live id");
        assert!(!publication.is_zero(), "EVENT.publication must be a live id");
        payload.assert_valid();
        Event {
            subscription,
            publication,
            payload,
            publisher: None,
            publisher_authid: None,
            publisher_authrole: None,
            topic: None,
            retained: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[4, 5, 6], "4, 5 or 6")?;
        let subscription = check_or_raise_nonzero_id(Self::NAME, "subscription", &wmsg[1])?;
        let publication = check_or_raise_nonzero_id(Self::NAME, "publication", &wmsg[2])?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[3])?;

        let reader = OptionReader::new(Self::NAME, &details);
        let payload = AppPayload::parse(Self::NAME, &wmsg[4..], &reader)?;

        Ok(Event {
            subscription,
            publication,
            payload,
            publisher: reader.id_opt("publisher")?,
            publisher_authid: reader.string_opt("publisher_authid")?,
            publisher_authrole: reader.string_opt("publisher_authrole")?,
            topic: reader.uri_opt("topic", UriRules::default())?,
            retained: reader.bool_opt("retained")?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&Self::RECOGNIZED),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.payload.assert_valid();
        let mut details = self.custom.clone();
        if let Some(publisher) = self.publisher {
            details.insert("publisher".into(), Value::from(publisher.into_raw()));
        }
        if let Some(publisher_authid) = &self.publisher_authid {
            details.insert("publisher_authid".into(), Value::from(publisher_authid.as_str()));
        }
        if let Some(publisher_authrole) = &self.publisher_authrole {
            details.insert(
                "publisher_authrole".into(),
                Value::from(publisher_authrole.as_str()),
            );
        }
        if let Some(topic) = &self.topic {
            details.insert("topic".into(), Value::from(topic.as_str()));
        }
        if let Some(retained) = self.retained {
            details.insert("retained".into(), Value::Bool(retained));
        }
        marshal_forward_for(&self.forward_for, &mut details);

        let mut tail = Vec::new();
        self.payload.marshal_into(&mut tail, &mut details);

        let mut wire = vec![
            Value::Integer(MessageType::Event as i64),
            Value::from(self.subscription.into_raw()),
            Value::from(self.publication.into_raw()),
            Value::Dict(details),
        ];
        wire.extend(tail);
        wire
    }
}

/// `[CALL, request|id, options|dict, procedure|uri, args?, kwargs?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub request: WampId,
    pub procedure: Uri,
    pub payload: AppPayload,
    /// Call timeout in milliseconds; zero means no timeout.
    pub timeout: Option<u64>,
    pub receive_progress: Option<bool>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Call {
    pub const NAME: &'static str = "CALL";

    const RECOGNIZED: [&'static str; 6] = [
        "timeout",
        "receive_progress",
        "forward_for",
        "enc_algo",
        "enc_key",
        "enc_serializer",
    ];

    pub fn new(request: WampId, procedure: Uri, payload: AppPayload) -> Self {
        assert!(!request.is_zero(), "CALL.request must be a live id");
        payload.assert_valid();
        Call {
            request,
            procedure,
            payload,
            timeout: None,
            receive_progress: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[4, 5, 6], "4, 5 or 6")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let options = check_or_raise_extra(Self::NAME, "options", &wmsg[2])?;
        let procedure =
            check_or_raise_required_uri(Self::NAME, "procedure", &wmsg[3], UriRules::default())?;

        let reader = OptionReader::new(Self::NAME, &options);
        let payload = AppPayload::parse(Self::NAME, &wmsg[4..], &reader)?;

        Ok(Call {
            request,
            procedure,
            payload,
            timeout: reader.non_negative_int_opt("timeout")?,
            receive_progress: reader.bool_opt("receive_progress")?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&Self::RECOGNIZED),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.payload.assert_valid();
        let mut options = self.custom.clone();
        if let Some(timeout) = self.timeout {
            options.insert("timeout".into(), Value::from(timeout));
        }
        if let Some(receive_progress) = self.receive_progress {
            options.insert("receive_progress".into(), Value::Bool(receive_progress));
        }
        marshal_forward_for(&self.forward_for, &mut options);

        let mut tail = Vec::new();
        self.payload.marshal_into(&mut tail, &mut options);

        let mut wire = vec![
            Value::Integer(MessageType::Call as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(options),
            Value::from(self.procedure.as_str()),
        ];
        wire.extend(tail);
        wire
    }
}

/// `[RESULT, request|id, details|dict, args?, kwargs?]`
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub request: WampId,
    pub payload: AppPayload,
    pub progress: Option<bool>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl CallResult {
    pub const NAME: &'static str = "RESULT";

    pub fn new(request: WampId, payload: AppPayload) -> Self {
        assert!(!request.is_zero(), "RESULT.request must be a live id");
        payload.assert_valid();
        CallResult {
            request,
            payload,
            progress: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3, 4, 5], "3, 4 or 5")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[2])?;

        let reader = OptionReader::new(Self::NAME, &details);
        let payload = AppPayload::parse(Self::NAME, &wmsg[3..], &reader)?;

        Ok(CallResult {
            request,
            payload,
            progress: reader.bool_opt("progress")?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&[
                "progress",
                "forward_for",
                "enc_algo",
                "enc_key",
                "enc_serializer",
            ]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.payload.assert_valid();
        let mut details = self.custom.clone();
        if let Some(progress) = self.progress {
            details.insert("progress".into(), Value::Bool(progress));
        }
        marshal_forward_for(&self.forward_for, &mut details);

        let mut tail = Vec::new();
        self.payload.marshal_into(&mut tail, &mut details);

        let mut wire = vec![
            Value::Integer(MessageType::Result as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(details),
        ];
        wire.extend(tail);
        wire
    }
}

/// `[INVOCATION, request|id, registration|id, details|dict, args?, kwargs?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub request: WampId,
    pub registration: WampId,
    pub payload: AppPayload,
    pub timeout: Option<u64>,
    pub receive_progress: Option<bool>,
    pub caller: Option<WampId>,
    pub caller_authid: Option<String>,
    pub caller_authrole: Option<String>,
    pub procedure: Option<Uri>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Invocation {
    pub const NAME: &'static str = "INVOCATION";

    const RECOGNIZED: [&'static str; 10] = [
        "timeout",
        "receive_progress",
        "caller",
        "caller_authid",
        "caller_authrole",
        "procedure",
        "forward_for",
        "enc_algo",
        "enc_key",
        "enc_serializer",
    ];

    pub fn new(request: WampId, registration: WampId, payload: AppPayload) -> Self {
        assert!(!request.is_zero(), "INVOCATION.request must be a live id");
        assert!(
            !registration.is_zero(),
            "INVOCATION.registration must be a live id"
        );
        payload.assert_valid();
        Invocation {
            request,
            registration,
            payload,
            timeout: None,
            receive_progress: None,
            caller: None,
            caller_authid: None,
            caller_authrole: None,
            procedure: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[4, 5, 6], "4, 5 or 6")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let registration = check_or_raise_nonzero_id(Self::NAME, "registration", &wmsg[2])?;
        let details = check_or_raise_extra(Self::NAME, "details", &wmsg[3])?;

        let reader = OptionReader::new(Self::NAME, &details);
        let payload = AppPayload::parse(Self::NAME, &wmsg[4..], &reader)?;

        Ok(Invocation {
            request,
            registration,
            payload,
            timeout: reader.non_negative_int_opt("timeout")?,
            receive_progress: reader.bool_opt("receive_progress")?,
            caller: reader.id_opt("caller")?,
            caller_authid: reader.string_opt("caller_authid")?,
            caller_authrole: reader.string_opt("caller_authrole")?,
            procedure: reader.uri_opt("procedure", UriRules::default())?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&Self::RECOGNIZED),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.payload.assert_valid();
        let mut details = self.custom.clone();
        if let Some(timeout) = self.timeout {
            details.insert("timeout".into(), Value::from(timeout));
        }
        if let Some(receive_progress) = self.receive_progress {
            details.insert("receive_progress".into(), Value::Bool(receive_progress));
        }
        if let Some(caller) = self.caller {
            details.insert("caller".into(), Value::from(caller.into_raw()));
        }
        if let Some(caller_authid) = &self.caller_authid {
            details.insert("caller_authid".into(), Value::from(caller_authid.as_str()));
        }
        if let Some(caller_authrole) = &self.caller_authrole {
            details.insert("caller_authrole".into(), Value::from(caller_authrole.as_str()));
        }
        if let Some(procedure) = &self.procedure {
            details.insert("procedure".into(), Value::from(procedure.as_str()));
        }
        marshal_forward_for(&self.forward_for, &mut details);

        let mut tail = Vec::new();
        self.payload.marshal_into(&mut tail, &mut details);

        let mut wire = vec![
            Value::Integer(MessageType::Invocation as i64),
            Value::from(self.request.into_raw()),
            Value::from(self.registration.into_raw()),
            Value::Dict(details),
        ];
        wire.extend(tail);
        wire
    }
}

/// `[YIELD, request|id, options|dict, args?, kwargs?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Yield {
    pub request: WampId,
    pub payload: AppPayload,
    pub progress: Option<bool>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Yield {
    pub const NAME: &'static str = "YIELD";

    pub fn new(request: WampId, payload: AppPayload) -> Self {
        assert!(!request.is_zero(), "YIELD.request must be a live id");
        payload.assert_valid();
        Yield {
            request,
            payload,
            progress: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3, 4, 5], "3, 4 or 5")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let options = check_or_raise_extra(Self::NAME, "options", &wmsg[2])?;

        let reader = OptionReader::new(Self::NAME, &options);
        let payload = AppPayload::parse(Self::NAME, &wmsg[3..], &reader)?;

        Ok(Yield {
            request,
            payload,
            progress: reader.bool_opt("progress")?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&[
                "progress",
                "forward_for",
                "enc_algo",
                "enc_key",
                "enc_serializer",
            ]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.payload.assert_valid();
        let mut options = self.custom.clone();
        if let Some(progress) = self.progress {
            options.insert("progress".into(), Value::Bool(progress));
        }
        marshal_forward_for(&self.forward_for, &mut options);

        let mut tail = Vec::new();
        self.payload.marshal_into(&mut tail, &mut options);

        let mut wire = vec![
            Value::Integer(MessageType::Yield as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(options),
        ];
        wire.extend(tail);
        wire
    }
}

fn id_list(ids: &[WampId]) -> Value {
    Value::List(ids.iter().map(|id| Value::from(id.into_raw())).collect())
}

fn string_list(items: &[String]) -> Value {
    Value::List(items.iter().map(|s| Value::from(s.as_str())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wamp_types::PayloadEncAlgo;

    fn id(raw: u64) -> WampId {
        WampId::try_new(raw).unwrap()
    }

    #[test]
    fn call_marshals_documented_array_form() {
        let call = Call::new(
            id(123),
            Uri::unchecked("com.example.add"),
            AppPayload::structured(Some(vec![Value::Integer(2), Value::Integer(3)]), None),
        );
        let wire = call.marshal();
        assert_eq!(
            wire,
            vec![
                Value::Integer(48),
                Value::Integer(123),
                Value::Dict(Dict::new()),
                Value::from("com.example.add"),
                Value::List(vec![Value::Integer(2), Value::Integer(3)]),
            ]
        );
        assert_eq!(Call::parse(&wire).unwrap(), call);
    }

    #[test]
    fn error_without_payload_is_five_elements() {
        let error = Error::new(
            MessageType::Call,
            id(123),
            Uri::unchecked("wamp.error.no_such_procedure"),
            AppPayload::default(),
        );
        assert_eq!(
            error.marshal(),
            vec![
                Value::Integer(8),
                Value::Integer(48),
                Value::Integer(123),
                Value::Dict(Dict::new()),
                Value::from("wamp.error.no_such_procedure"),
            ]
        );
    }

    #[test]
    fn error_rejects_non_request_type_code() {
        let wire = vec![
            Value::Integer(8),
            Value::Integer(2), // WELCOME never carries a request
            Value::Integer(123),
            Value::Dict(Dict::new()),
            Value::from("wamp.error.no_such_procedure"),
        ];
        assert!(Error::parse(&wire).is_err());
    }

    #[test]
    fn publish_roundtrip_with_exclusion_lists() {
        let mut publish = Publish::new(
            id(239714735),
            Uri::unchecked("com.myapp.topic1"),
            AppPayload::structured(None, Some([("color".to_string(), Value::from("orange"))].into())),
        );
        publish.acknowledge = Some(true);
        publish.exclude = Some(vec![id(7), id(9)]);
        publish.eligible_authrole = Some(vec!["admin".into()]);
        let wire = publish.marshal();
        // kwargs force an empty args slot
        assert_eq!(wire[4], Value::List(vec![]));
        assert_eq!(Publish::parse(&wire).unwrap(), publish);
    }

    #[test]
    fn kwargs_only_publish_roundtrips_to_identity() {
        let publish = Publish::new(
            id(1),
            Uri::unchecked("com.myapp.topic1"),
            AppPayload::structured(
                None,
                Some([("color".to_string(), Value::from("orange"))].into()),
            ),
        );
        let parsed = Publish::parse(&publish.marshal()).unwrap();
        assert_eq!(parsed.payload.args, None);
        assert_eq!(parsed, publish);
    }

    #[test]
    fn event_always_emits_details_slot() {
        let event = Event::new(id(5512315355), id(4429313566), AppPayload::default());
        let wire = event.marshal();
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[3], Value::Dict(Dict::new()));
        assert_eq!(Event::parse(&wire).unwrap(), event);
    }

    #[test]
    fn event_publisher_details_roundtrip() {
        let mut event = Event::new(
            id(1),
            id(2),
            AppPayload::structured(Some(vec![Value::from("hi")]), None),
        );
        event.publisher = Some(id(77));
        event.publisher_authid = Some("alice".into());
        event.topic = Some(Uri::unchecked("com.myapp.topic1"));
        event.retained = Some(true);
        assert_eq!(Event::parse(&event.marshal()).unwrap(), event);
    }

    #[test]
    fn opaque_payload_roundtrips_through_call() {
        let call = Call::new(
            id(42),
            Uri::unchecked("com.example.secret"),
            AppPayload::opaque(
                vec![0xde, 0xad, 0xbe, 0xef],
                Some(PayloadEncAlgo::Cryptobox),
                Some("pubkey".into()),
                None,
            ),
        );
        let wire = call.marshal();
        assert_eq!(wire.len(), 5);
        assert_eq!(wire[4], Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
        let options = wire[2].as_dict().unwrap();
        assert_eq!(options.get("enc_algo"), Some(&Value::from("cryptobox")));
        assert_eq!(Call::parse(&wire).unwrap(), call);
    }

    #[test]
    fn invocation_roundtrip_with_caller_disclosure() {
        let mut invocation = Invocation::new(
            id(6131533),
            id(9823526),
            AppPayload::structured(Some(vec![Value::Integer(2), Value::Integer(3)]), None),
        );
        invocation.caller = Some(id(3335656));
        invocation.caller_authid = Some("bob".into());
        invocation.procedure = Some(Uri::unchecked("com.example.add"));
        invocation.timeout = Some(1000);
        assert_eq!(Invocation::parse(&invocation.marshal()).unwrap(), invocation);
    }

    #[test]
    fn result_progress_roundtrip() {
        let mut result = CallResult::new(
            id(123),
            AppPayload::structured(Some(vec![Value::Integer(5)]), None),
        );
        result.progress = Some(true);
        assert_eq!(CallResult::parse(&result.marshal()).unwrap(), result);
    }

    #[test]
    fn yield_minimal_is_three_elements() {
        let yield_msg = Yield::new(id(6131533), AppPayload::default());
        let wire = yield_msg.marshal();
        assert_eq!(wire.len(), 3);
        assert_eq!(Yield::parse(&wire).unwrap(), yield_msg);
    }

    #[test]
    fn call_rejects_zero_request() {
        let wire = vec![
            Value::Integer(48),
            Value::Integer(0),
            Value::Dict(Dict::new()),
            Value::from("com.example.add"),
        ];
        assert!(Call::parse(&wire).is_err());
    }

    #[test]
    fn call_timeout_must_be_non_negative_integer() {
        let wire = vec![
            Value::Integer(48),
            Value::Integer(1),
            Value::Dict([("timeout".to_string(), Value::Integer(-1))].into()),
            Value::from("com.example.add"),
        ];
        assert!(Call::parse(&wire).is_err());
    }
}
