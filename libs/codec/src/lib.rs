//! # WAMP Message Codec
//!
//! ## Purpose
//!
//! This crate is the "Rules" layer of the WAMP stack: it defines every
//! message type exchanged between peer and router, validates each one
//! against the protocol, and converts messages to/from wire bytes. The
//! transport above it only moves framed byte buffers; the session layer
//! below it only sees validated message structs.
//!
//! ## Architecture Role
//!
//! ```text
//! wamp-types  →  [wamp-codec]  →  transport/session
//!     ↑              ↓                   ↓
//! Pure Data    Protocol Rules       Framed Bytes
//! Value/Uri    Validation and       WebSocket /
//! WampId       Encoding             RawSocket
//! ```
//!
//! ## What This Crate Contains
//! - Per-type message codecs with `parse`/`marshal` (generic array) and
//!   `build`/`cast` (zero-copy binary)
//! - The [`Message`] closed union and [`WampMessage`] wrapper with the
//!   per-serializer encoding cache
//! - Field validation primitives and the [`ProtocolError`] taxonomy
//! - The [`Serializer`] registry (JSON / MessagePack / CBOR / binary)
//!
//! ## What This Crate Does NOT Contain
//! - Transport framing or socket management
//! - Broker/dealer bookkeeping (subscriptions, registrations)
//! - Authentication algorithms — only their wire representation
//!
//! ## Usage
//!
//! ```rust
//! use wamp_codec::{decode, Message, Serializer, WampMessage};
//! use wamp_codec::messages::{AppPayload, Call};
//! use wamp_types::{Uri, UriRules, Value, WampId};
//!
//! let call = Call::new(
//!     WampId::try_new(123).unwrap(),
//!     Uri::try_new("com.example.add", UriRules::default()).unwrap(),
//!     AppPayload::structured(Some(vec![Value::Integer(2), Value::Integer(3)]), None),
//! );
//! let message = WampMessage::new(Message::Call(call));
//!
//! let bytes = message.serialize(&Serializer::Json).unwrap();
//! let received = decode(&bytes, &Serializer::Json).unwrap();
//! assert_eq!(received, message);
//! ```

pub mod binary;
pub mod error;
pub mod messages;
pub mod serializer;
pub mod validation;

pub use binary::{build, cast, AnyMessage, MessageView};
pub use error::{InvalidUriError, ProtocolError, ProtocolResult, SerializationError};
pub use messages::{Correlation, Message, MessageType, WampMessage};
pub use serializer::{Serializer, SerializerId};

/// Decode one complete wire frame into an owned message.
///
/// Dispatches on the serializer's encoding family: array-family bytes
/// decode to the generic array and go through [`Message::parse`];
/// binary-family bytes are cast to a view and materialized, which routes
/// through the same parse path. Either way a failed decode returns only
/// the error — never a half-initialized message.
pub fn decode(bytes: &[u8], serializer: &Serializer) -> ProtocolResult<WampMessage> {
    let body = match serializer {
        Serializer::Binary { payload } => binary::cast(bytes, payload)?.materialize()?,
        _ => {
            let array = serializer.unserialize_array(bytes)?;
            Message::parse(&array)?
        }
    };
    Ok(WampMessage::new(body))
}

/// Decode a binary frame into a lazy view borrowing from `bytes`.
///
/// Fails when the serializer is not binary-family; use [`decode`] for
/// the array encodings.
pub fn decode_view<'a>(
    bytes: &'a [u8],
    serializer: &Serializer,
) -> ProtocolResult<MessageView<'a>> {
    match serializer {
        Serializer::Binary { payload } => binary::cast(bytes, payload),
        other => Err(ProtocolError::InvalidEnvelope {
            reason: format!("serializer {} has no zero-copy view form", other.id()),
        }),
    }
}
