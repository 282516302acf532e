//! Zero-copy binary wire encoding.
//!
//! ## Purpose
//!
//! The array encodings (JSON/MessagePack/CBOR) decode a whole message up
//! front. Router hot paths that only need the type code and request id
//! pay for full decoding they never use. The binary encoding answers
//! that: a checksummed envelope plus tagged field entries, wrapped by
//! [`MessageView`] which decodes each field lazily on first access.
//!
//! ```text
//!   Message ──build──▶ [BinaryHeader][tag,len,bytes]… ──cast──▶ MessageView
//!      ▲                                                            │
//!      └──────────────────── materialize ◀──────────────────────────┘
//! ```
//!
//! `build` works from the message's marshalled generic array, and
//! `materialize` reconstructs that array and routes it through
//! [`Message::parse`], so both encodings enforce exactly the same
//! validation rules.

use wamp_types::{PayloadSerializerId, Value};

use crate::error::{ProtocolResult, SerializationError};
use crate::messages::Message;
use crate::serializer::encode_payload_value;

mod envelope;
mod fields;
mod view;

pub use envelope::{BinaryBuilder, BinaryHeader, BINARY_MAGIC, BINARY_VERSION};
pub use fields::{schema, FieldKind, FieldTag, Schema, Slot, SlotPresence};
pub use view::{AnyMessage, MessageView};

/// Encode a message into a binary frame.
///
/// Composite fields (options/details/args/kwargs) are sub-serialized
/// with `payload_serializer`; the opaque application payload passes
/// through raw.
pub fn build(
    message: &Message,
    payload_serializer: &PayloadSerializerId,
) -> Result<Vec<u8>, SerializationError> {
    let wire = message.marshal();
    let schema = fields::schema(message.message_type());
    let mut builder = BinaryBuilder::new(message.message_type());

    let mut index = 1;
    for slot in schema.slots {
        let Some(value) = wire.get(index) else {
            // trailing optional slot omitted by marshal
            break;
        };
        index += 1;

        if slot.presence == SlotPresence::NullWhenAbsent && value.is_null() {
            continue;
        }

        match slot.tag.kind() {
            FieldKind::Id => {
                let raw = value.as_u64().ok_or_else(|| {
                    SerializationError::encode(
                        "binary",
                        format!("{:?} slot is not an integer", slot.tag),
                    )
                })?;
                builder.push_field(slot.tag, &raw.to_le_bytes());
            }
            FieldKind::Text => {
                let text = value.as_str().ok_or_else(|| {
                    SerializationError::encode(
                        "binary",
                        format!("{:?} slot is not a string", slot.tag),
                    )
                })?;
                builder.push_field(slot.tag, text.as_bytes());
            }
            FieldKind::Composite => {
                let bytes = encode_payload_value(Some(payload_serializer), value)?;
                builder.push_field(slot.tag, &bytes);
            }
            FieldKind::Raw => {
                return Err(SerializationError::encode(
                    "binary",
                    format!("{:?} cannot appear as a fixed slot", slot.tag),
                ));
            }
        }
    }

    if schema.app_tail {
        match &wire[index..] {
            [] => {}
            [Value::Bytes(payload)] => builder.push_field(FieldTag::Payload, payload),
            [args] => {
                let bytes = encode_payload_value(Some(payload_serializer), args)?;
                builder.push_field(FieldTag::Args, &bytes);
            }
            [args, kwargs] => {
                let bytes = encode_payload_value(Some(payload_serializer), args)?;
                builder.push_field(FieldTag::Args, &bytes);
                let bytes = encode_payload_value(Some(payload_serializer), kwargs)?;
                builder.push_field(FieldTag::Kwargs, &bytes);
            }
            tail => {
                return Err(SerializationError::encode(
                    "binary",
                    format!("unexpected {}-element application tail", tail.len()),
                ));
            }
        }
    }

    Ok(builder.finish())
}

/// Wrap a received binary frame in a lazy [`MessageView`].
pub fn cast<'a>(
    frame: &'a [u8],
    payload_serializer: &PayloadSerializerId,
) -> ProtocolResult<MessageView<'a>> {
    MessageView::cast(frame, payload_serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{AppPayload, Call};
    use wamp_types::{Uri, WampId};

    fn sample_call() -> Message {
        Message::Call(Call::new(
            WampId::try_new(123).unwrap(),
            Uri::unchecked("com.example.add"),
            AppPayload::structured(Some(vec![Value::Integer(2), Value::Integer(3)]), None),
        ))
    }

    #[test]
    fn build_then_cast_materializes_equal_message() {
        let message = sample_call();
        let frame = build(&message, &PayloadSerializerId::Cbor).unwrap();
        let view = cast(&frame, &PayloadSerializerId::Cbor).unwrap();
        assert_eq!(view.type_code(), 48);
        assert_eq!(view.materialize().unwrap(), message);
    }

    #[test]
    fn view_decodes_fields_lazily() {
        let message = sample_call();
        let frame = build(&message, &PayloadSerializerId::Cbor).unwrap();
        let view = cast(&frame, &PayloadSerializerId::Cbor).unwrap();

        assert_eq!(view.request().unwrap(), Some(WampId::try_new(123).unwrap()));
        let args = view.args().unwrap().unwrap();
        assert_eq!(args, &[Value::Integer(2), Value::Integer(3)]);
        // second access hits the memoized slot
        assert_eq!(view.args().unwrap().unwrap(), args);
    }

    #[test]
    fn raw_field_borrows_from_frame() {
        let message = sample_call();
        let frame = build(&message, &PayloadSerializerId::Cbor).unwrap();
        let view = cast(&frame, &PayloadSerializerId::Cbor).unwrap();

        let raw = view.raw_field(FieldTag::Request).unwrap();
        let frame_range = frame.as_ptr_range();
        assert!(frame_range.contains(&raw.as_ptr()));
        assert_eq!(raw, 123u64.to_le_bytes());
    }

    #[test]
    fn truncated_frame_rejected() {
        let message = sample_call();
        let frame = build(&message, &PayloadSerializerId::Cbor).unwrap();
        assert!(cast(&frame[..frame.len() - 3], &PayloadSerializerId::Cbor).is_err());
        assert!(cast(&frame[..8], &PayloadSerializerId::Cbor).is_err());
    }
}
