//! WAMP message type registry and the closed message union.
//!
//! ## Architecture
//!
//! ```text
//!     wire array          ┌──────────────┐       owned message
//!   [code, ...] ────────▶ │ Message::parse│ ────▶ Message::Call(..)
//!                         │  (dispatch on │
//!                         │   type code)  │
//!   [code, ...] ◀──────── │ Message::     │ ◀──── application code
//!                         │   marshal     │
//!                         └──────────────┘
//! ```
//!
//! The protocol fixes the set of message types, so the union is a closed
//! enum with exhaustive matching rather than open polymorphism: adding a
//! type without wiring parse/marshal is a compile error.
//!
//! [`WampMessage`] wraps a [`Message`] with non-wire correlation metadata
//! and the per-serializer encoding cache used for fan-out sends.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::trace;
use wamp_types::{Value, WampId};

use crate::error::{ProtocolError, ProtocolResult, SerializationError};
use crate::serializer::{Serializer, SerializerId};

pub mod common;
pub mod data;
pub mod pubsub;
pub mod rpc;
pub mod session;

pub use common::AppPayload;
pub use data::{Call, CallResult, Error, Event, Invocation, Publish, Yield};
pub use pubsub::{Published, Subscribe, Subscribed, Unsubscribe, Unsubscribed};
pub use rpc::{Cancel, EventReceived, Interrupt, Register, Registered, Unregister, Unregistered};
pub use session::{Abort, Authenticate, Challenge, Goodbye, Hello, Welcome, CLOSE_NORMAL};

/// Wire type codes, fixed by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MessageType {
    Hello = 1,
    Welcome = 2,
    Abort = 3,
    Challenge = 4,
    Authenticate = 5,
    Goodbye = 6,
    Error = 8,
    Publish = 16,
    Published = 17,
    Subscribe = 32,
    Subscribed = 33,
    Unsubscribe = 34,
    Unsubscribed = 35,
    Event = 36,
    EventReceived = 37,
    Call = 48,
    Cancel = 49,
    Result = 50,
    Register = 64,
    Registered = 65,
    Unregister = 66,
    Unregistered = 67,
    Invocation = 68,
    Interrupt = 69,
    Yield = 70,
}

impl MessageType {
    pub fn name(&self) -> &'static str {
        match self {
            MessageType::Hello => Hello::NAME,
            MessageType::Welcome => Welcome::NAME,
            MessageType::Abort => Abort::NAME,
            MessageType::Challenge => Challenge::NAME,
            MessageType::Authenticate => Authenticate::NAME,
            MessageType::Goodbye => Goodbye::NAME,
            MessageType::Error => Error::NAME,
            MessageType::Publish => Publish::NAME,
            MessageType::Published => Published::NAME,
            MessageType::Subscribe => Subscribe::NAME,
            MessageType::Subscribed => Subscribed::NAME,
            MessageType::Unsubscribe => Unsubscribe::NAME,
            MessageType::Unsubscribed => Unsubscribed::NAME,
            MessageType::Event => Event::NAME,
            MessageType::EventReceived => EventReceived::NAME,
            MessageType::Call => Call::NAME,
            MessageType::Cancel => Cancel::NAME,
            MessageType::Result => CallResult::NAME,
            MessageType::Register => Register::NAME,
            MessageType::Registered => Registered::NAME,
            MessageType::Unregister => Unregister::NAME,
            MessageType::Unregistered => Unregistered::NAME,
            MessageType::Invocation => Invocation::NAME,
            MessageType::Interrupt => Interrupt::NAME,
            MessageType::Yield => Yield::NAME,
        }
    }
}

/// Closed union over every concrete message type.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Hello(Hello),
    Welcome(Welcome),
    Abort(Abort),
    Challenge(Challenge),
    Authenticate(Authenticate),
    Goodbye(Goodbye),
    Error(Error),
    Publish(Publish),
    Published(Published),
    Subscribe(Subscribe),
    Subscribed(Subscribed),
    Unsubscribe(Unsubscribe),
    Unsubscribed(Unsubscribed),
    Event(Event),
    EventReceived(EventReceived),
    Call(Call),
    Cancel(Cancel),
    Result(CallResult),
    Register(Register),
    Registered(Registered),
    Unregister(Unregister),
    Unregistered(Unregistered),
    Invocation(Invocation),
    Interrupt(Interrupt),
    Yield(Yield),
}

impl Message {
    /// Validate the envelope (leading integer type code) and dispatch to
    /// the concrete type's parse.
    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        let code = match wmsg.first() {
            None => {
                return Err(ProtocolError::InvalidEnvelope {
                    reason: "empty message array".into(),
                })
            }
            Some(value @ (Value::Integer(_) | Value::UInteger(_))) => {
                value.as_u64().ok_or_else(|| ProtocolError::InvalidEnvelope {
                    reason: format!("negative type code {value:?}"),
                })?
            }
            Some(other) => {
                return Err(ProtocolError::InvalidEnvelope {
                    reason: format!("type code must be an integer, got {}", other.type_name()),
                })
            }
        };
        let message_type = u8::try_from(code)
            .ok()
            .and_then(|code| MessageType::try_from(code).ok())
            .ok_or(ProtocolError::UnknownMessageType { code })?;

        Ok(match message_type {
            MessageType::Hello => Message::Hello(Hello::parse(wmsg)?),
            MessageType::Welcome => Message::Welcome(Welcome::parse(wmsg)?),
            MessageType::Abort => Message::Abort(Abort::parse(wmsg)?),
            MessageType::Challenge => Message::Challenge(Challenge::parse(wmsg)?),
            MessageType::Authenticate => Message::Authenticate(Authenticate::parse(wmsg)?),
            MessageType::Goodbye => Message::Goodbye(Goodbye::parse(wmsg)?),
            MessageType::Error => Message::Error(Error::parse(wmsg)?),
            MessageType::Publish => Message::Publish(Publish::parse(wmsg)?),
            MessageType::Published => Message::Published(Published::parse(wmsg)?),
            MessageType::Subscribe => Message::Subscribe(Subscribe::parse(wmsg)?),
            MessageType::Subscribed => Message::Subscribed(Subscribed::parse(wmsg)?),
            MessageType::Unsubscribe => Message::Unsubscribe(Unsubscribe::parse(wmsg)?),
            MessageType::Unsubscribed => Message::Unsubscribed(Unsubscribed::parse(wmsg)?),
            MessageType::Event => Message::Event(Event::parse(wmsg)?),
            MessageType::EventReceived => Message::EventReceived(EventReceived::parse(wmsg)?),
            MessageType::Call => Message::Call(Call::parse(wmsg)?),
            MessageType::Cancel => Message::Cancel(Cancel::parse(wmsg)?),
            MessageType::Result => Message::Result(CallResult::parse(wmsg)?),
            MessageType::Register => Message::Register(Register::parse(wmsg)?),
            MessageType::Registered => Message::Registered(Registered::parse(wmsg)?),
            MessageType::Unregister => Message::Unregister(Unregister::parse(wmsg)?),
            MessageType::Unregistered => Message::Unregistered(Unregistered::parse(wmsg)?),
            MessageType::Invocation => Message::Invocation(Invocation::parse(wmsg)?),
            MessageType::Interrupt => Message::Interrupt(Interrupt::parse(wmsg)?),
            MessageType::Yield => Message::Yield(Yield::parse(wmsg)?),
        })
    }

    /// Produce the canonical wire array for this message.
    pub fn marshal(&self) -> Vec<Value> {
        match self {
            Message::Hello(m) => m.marshal(),
            Message::Welcome(m) => m.marshal(),
            Message::Abort(m) => m.marshal(),
            Message::Challenge(m) => m.marshal(),
            Message::Authenticate(m) => m.marshal(),
            Message::Goodbye(m) => m.marshal(),
            Message::Error(m) => m.marshal(),
            Message::Publish(m) => m.marshal(),
            Message::Published(m) => m.marshal(),
            Message::Subscribe(m) => m.marshal(),
            Message::Subscribed(m) => m.marshal(),
            Message::Unsubscribe(m) => m.marshal(),
            Message::Unsubscribed(m) => m.marshal(),
            Message::Event(m) => m.marshal(),
            Message::EventReceived(m) => m.marshal(),
            Message::Call(m) => m.marshal(),
            Message::Cancel(m) => m.marshal(),
            Message::Result(m) => m.marshal(),
            Message::Register(m) => m.marshal(),
            Message::Registered(m) => m.marshal(),
            Message::Unregister(m) => m.marshal(),
            Message::Unregistered(m) => m.marshal(),
            Message::Invocation(m) => m.marshal(),
            Message::Interrupt(m) => m.marshal(),
            Message::Yield(m) => m.marshal(),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Hello(_) => MessageType::Hello,
            Message::Welcome(_) => MessageType::Welcome,
            Message::Abort(_) => MessageType::Abort,
            Message::Challenge(_) => MessageType::Challenge,
            Message::Authenticate(_) => MessageType::Authenticate,
            Message::Goodbye(_) => MessageType::Goodbye,
            Message::Error(_) => MessageType::Error,
            Message::Publish(_) => MessageType::Publish,
            Message::Published(_) => MessageType::Published,
            Message::Subscribe(_) => MessageType::Subscribe,
            Message::Subscribed(_) => MessageType::Subscribed,
            Message::Unsubscribe(_) => MessageType::Unsubscribe,
            Message::Unsubscribed(_) => MessageType::Unsubscribed,
            Message::Event(_) => MessageType::Event,
            Message::EventReceived(_) => MessageType::EventReceived,
            Message::Call(_) => MessageType::Call,
            Message::Cancel(_) => MessageType::Cancel,
            Message::Result(_) => MessageType::Result,
            Message::Register(_) => MessageType::Register,
            Message::Registered(_) => MessageType::Registered,
            Message::Unregister(_) => MessageType::Unregister,
            Message::Unregistered(_) => MessageType::Unregistered,
            Message::Invocation(_) => MessageType::Invocation,
            Message::Interrupt(_) => MessageType::Interrupt,
            Message::Yield(_) => MessageType::Yield,
        }
    }

    pub fn type_code(&self) -> u8 {
        self.message_type().into()
    }

    pub fn name(&self) -> &'static str {
        self.message_type().name()
    }

    /// The request id carried by request/reply-correlated types, if any.
    pub fn request(&self) -> Option<WampId> {
        match self {
            Message::Error(m) => Some(m.request),
            Message::Publish(m) => Some(m.request),
            Message::Published(m) => Some(m.request),
            Message::Subscribe(m) => Some(m.request),
            Message::Subscribed(m) => Some(m.request),
            Message::Unsubscribe(m) => Some(m.request),
            Message::Unsubscribed(m) => Some(m.request),
            Message::Call(m) => Some(m.request),
            Message::Cancel(m) => Some(m.request),
            Message::Result(m) => Some(m.request),
            Message::Register(m) => Some(m.request),
            Message::Registered(m) => Some(m.request),
            Message::Unregister(m) => Some(m.request),
            Message::Unregistered(m) => Some(m.request),
            Message::Invocation(m) => Some(m.request),
            Message::Interrupt(m) => Some(m.request),
            Message::Yield(m) => Some(m.request),
            _ => None,
        }
    }

    /// The application payload of the seven data-plane types.
    pub fn app_payload(&self) -> Option<&AppPayload> {
        match self {
            Message::Error(m) => Some(&m.payload),
            Message::Publish(m) => Some(&m.payload),
            Message::Event(m) => Some(&m.payload),
            Message::Call(m) => Some(&m.payload),
            Message::Result(m) => Some(&m.payload),
            Message::Invocation(m) => Some(&m.payload),
            Message::Yield(m) => Some(&m.payload),
            _ => None,
        }
    }
}

/// Free-form tracing metadata attached by routing code.
///
/// Never serialized; excluded from message equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correlation {
    pub id: Option<String>,
    pub uri: Option<String>,
    pub is_anchor: bool,
    pub is_last: bool,
}

/// A message plus its correlation metadata and per-serializer byte cache.
///
/// Fan-out sends reuse one `WampMessage`: the first `serialize` through a
/// given serializer encodes, every later one returns the cached bytes.
/// The cache tolerates concurrent readers; a race that encodes the same
/// bytes twice wastes work but cannot corrupt the map.
#[derive(Debug)]
pub struct WampMessage {
    body: Message,
    pub correlation: Correlation,
    cache: RwLock<BTreeMap<SerializerId, Arc<[u8]>>>,
}

impl WampMessage {
    pub fn new(body: Message) -> Self {
        WampMessage {
            body,
            correlation: Correlation::default(),
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn body(&self) -> &Message {
        &self.body
    }

    pub fn into_body(self) -> Message {
        self.body
    }

    /// Mutable access to the body; drops every cached encoding since the
    /// bytes may no longer reflect the fields.
    pub fn body_mut(&mut self) -> &mut Message {
        self.uncache();
        &mut self.body
    }

    /// Encode through `serializer`, consulting the cache first.
    pub fn serialize(&self, serializer: &Serializer) -> Result<Arc<[u8]>, SerializationError> {
        let key = serializer.id();
        if let Ok(cache) = self.cache.read() {
            if let Some(bytes) = cache.get(&key) {
                trace!(message = self.body.name(), serializer = %key, "encoding cache hit");
                return Ok(Arc::clone(bytes));
            }
        }

        trace!(message = self.body.name(), serializer = %key, "encoding cache miss");
        let bytes: Arc<[u8]> = serializer.encode(&self.body)?.into();
        if let Ok(mut cache) = self.cache.write() {
            cache.entry(key).or_insert_with(|| Arc::clone(&bytes));
        }
        Ok(bytes)
    }

    /// Invalidate every cached encoding.
    pub fn uncache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    #[cfg(test)]
    fn cached_serializers(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Clone for WampMessage {
    fn clone(&self) -> Self {
        // Cached bytes are derived state; a clone starts cold.
        WampMessage {
            body: self.body.clone(),
            correlation: self.correlation.clone(),
            cache: RwLock::new(BTreeMap::new()),
        }
    }
}

/// Equality is structural over wire-relevant fields only.
impl PartialEq for WampMessage {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

impl From<Message> for WampMessage {
    fn from(body: Message) -> Self {
        WampMessage::new(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wamp_types::Uri;

    fn sample_call() -> Message {
        Message::Call(Call::new(
            WampId::try_new(123).unwrap(),
            Uri::unchecked("com.example.add"),
            AppPayload::structured(Some(vec![Value::Integer(2), Value::Integer(3)]), None),
        ))
    }

    #[test]
    fn parse_dispatches_on_type_code() {
        let call = sample_call();
        let parsed = Message::parse(&call.marshal()).unwrap();
        assert_eq!(parsed, call);
        assert_eq!(parsed.type_code(), 48);
        assert_eq!(parsed.name(), "CALL");
    }

    #[test]
    fn parse_rejects_unknown_type_code() {
        let err = Message::parse(&[Value::Integer(99)]).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessageType { code: 99 }));
    }

    #[test]
    fn parse_rejects_non_integer_envelope() {
        assert!(Message::parse(&[]).is_err());
        assert!(Message::parse(&[Value::from("CALL")]).is_err());
        assert!(Message::parse(&[Value::Integer(-1)]).is_err());
    }

    #[test]
    fn serialize_caches_per_serializer() {
        let wrapped = WampMessage::new(sample_call());
        let first = wrapped.serialize(&Serializer::Json).unwrap();
        let second = wrapped.serialize(&Serializer::Json).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(wrapped.cached_serializers(), 1);

        wrapped.serialize(&Serializer::Cbor).unwrap();
        assert_eq!(wrapped.cached_serializers(), 2);

        wrapped.uncache();
        assert_eq!(wrapped.cached_serializers(), 0);
    }

    #[test]
    fn equality_ignores_correlation_and_cache() {
        let mut a = WampMessage::new(sample_call());
        let b = WampMessage::new(sample_call());
        a.correlation.id = Some("trace-1".into());
        a.serialize(&Serializer::Json).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn body_mut_invalidates_cache() {
        let mut wrapped = WampMessage::new(sample_call());
        wrapped.serialize(&Serializer::Json).unwrap();
        assert_eq!(wrapped.cached_serializers(), 1);
        wrapped.body_mut();
        assert_eq!(wrapped.cached_serializers(), 0);
    }
}
