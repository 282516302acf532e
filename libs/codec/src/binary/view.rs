//! Lazy, zero-copy message views over received binary frames.

use once_cell::unsync::OnceCell;
use wamp_types::{Dict, PayloadSerializerId, Value, WampId};

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{Message, MessageType};
use crate::serializer::decode_payload_value;

use super::envelope::BinaryHeader;
use super::fields::{schema, FieldKind, FieldTag, SlotPresence, TAG_SLOTS};
use zerocopy::FromBytes;

/// A message borrowed from a caller-owned binary frame.
///
/// Construction (`cast`) validates the envelope and records each field's
/// byte range in one pass without decoding anything. Field accessors
/// decode on first touch and memoize the result; decoding is idempotent
/// and has no side effect besides the memoization. The lifetime ties the
/// view to the frame, so it cannot outlive the buffer it borrows from.
pub struct MessageView<'a> {
    frame: &'a [u8],
    message_type: MessageType,
    payload_serializer: PayloadSerializerId,
    ranges: [Option<(usize, usize)>; TAG_SLOTS],
    cells: [OnceCell<Value>; TAG_SLOTS],
}

impl<'a> MessageView<'a> {
    /// Wrap a binary frame without copying.
    ///
    /// Validates magic, version, length, checksum and type code, and
    /// indexes the field entries. No field is decoded yet.
    pub fn cast(
        frame: &'a [u8],
        payload_serializer: &PayloadSerializerId,
    ) -> ProtocolResult<Self> {
        let header =
            BinaryHeader::read_from_prefix(frame).ok_or(ProtocolError::InvalidBinaryEnvelope {
                reason: format!("frame shorter than {}-byte header", BinaryHeader::SIZE),
                buffer_size: frame.len(),
            })?;
        header.validate(frame)?;

        let message_type = MessageType::try_from(header.message_type).map_err(|_| {
            ProtocolError::UnknownMessageType {
                code: header.message_type as u64,
            }
        })?;

        let mut ranges = [None; TAG_SLOTS];
        let mut offset = BinaryHeader::SIZE;
        while offset < frame.len() {
            if frame.len() - offset < 5 {
                return Err(ProtocolError::TruncatedField {
                    tag: frame[offset],
                    offset,
                    need: 5,
                    have: frame.len() - offset,
                });
            }
            let raw_tag = frame[offset];
            let len =
                u32::from_le_bytes(frame[offset + 1..offset + 5].try_into().expect("4 bytes"))
                    as usize;
            let start = offset + 5;
            if frame.len() - start < len {
                return Err(ProtocolError::TruncatedField {
                    tag: raw_tag,
                    offset,
                    need: len,
                    have: frame.len() - start,
                });
            }
            let tag = FieldTag::try_from(raw_tag).map_err(|_| {
                ProtocolError::InvalidBinaryEnvelope {
                    reason: format!("unknown field tag {raw_tag} at offset {offset}"),
                    buffer_size: frame.len(),
                }
            })?;
            let index = u8::from(tag) as usize;
            if ranges[index].is_some() {
                return Err(ProtocolError::InvalidBinaryEnvelope {
                    reason: format!("duplicate field tag {raw_tag} at offset {offset}"),
                    buffer_size: frame.len(),
                });
            }
            ranges[index] = Some((start, start + len));
            offset = start + len;
        }

        const EMPTY: OnceCell<Value> = OnceCell::new();
        Ok(MessageView {
            frame,
            message_type,
            payload_serializer: payload_serializer.clone(),
            ranges,
            cells: [EMPTY; TAG_SLOTS],
        })
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn type_code(&self) -> u8 {
        self.message_type.into()
    }

    pub fn name(&self) -> &'static str {
        self.message_type.name()
    }

    /// Undecoded bytes of a field, straight out of the frame.
    pub fn raw_field(&self, tag: FieldTag) -> Option<&'a [u8]> {
        self.ranges[u8::from(tag) as usize].map(|(start, end)| &self.frame[start..end])
    }

    /// Decoded value of a field, memoized on first access.
    pub fn field(&self, tag: FieldTag) -> ProtocolResult<Option<&Value>> {
        let index = u8::from(tag) as usize;
        let Some((start, end)) = self.ranges[index] else {
            return Ok(None);
        };
        let bytes = &self.frame[start..end];
        self.cells[index]
            .get_or_try_init(|| self.decode(tag, bytes))
            .map(Some)
    }

    fn decode(&self, tag: FieldTag, bytes: &[u8]) -> ProtocolResult<Value> {
        match tag.kind() {
            FieldKind::Id => {
                let raw: [u8; 8] =
                    bytes
                        .try_into()
                        .map_err(|_| ProtocolError::InvalidBinaryEnvelope {
                            reason: format!("id field {tag:?} is {} bytes, want 8", bytes.len()),
                            buffer_size: self.frame.len(),
                        })?;
                Ok(Value::from(u64::from_le_bytes(raw)))
            }
            FieldKind::Text => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    ProtocolError::InvalidBinaryEnvelope {
                        reason: format!("field {tag:?} is not UTF-8: {e}"),
                        buffer_size: self.frame.len(),
                    }
                })?;
                Ok(Value::Str(text.to_string()))
            }
            FieldKind::Composite => {
                let value = decode_payload_value(Some(&self.payload_serializer), bytes)?;
                Ok(value)
            }
            FieldKind::Raw => Ok(Value::Bytes(bytes.to_vec())),
        }
    }

    pub fn request(&self) -> ProtocolResult<Option<WampId>> {
        match self.field(FieldTag::Request)? {
            None => Ok(None),
            Some(value) => {
                let raw = value.as_u64().ok_or_else(|| {
                    ProtocolError::invalid_field(self.name(), "request", value)
                })?;
                WampId::try_new(raw)
                    .map(Some)
                    .map_err(|e| ProtocolError::invalid_id(self.name(), "request", e))
            }
        }
    }

    pub fn args(&self) -> ProtocolResult<Option<&[Value]>> {
        match self.field(FieldTag::Args)? {
            None => Ok(None),
            Some(value) => value
                .as_list()
                .map(Some)
                .ok_or_else(|| ProtocolError::invalid_field(self.name(), "args", value)),
        }
    }

    pub fn kwargs(&self) -> ProtocolResult<Option<&Dict>> {
        match self.field(FieldTag::Kwargs)? {
            None => Ok(None),
            Some(value) => value
                .as_dict()
                .map(Some)
                .ok_or_else(|| ProtocolError::invalid_field(self.name(), "kwargs", value)),
        }
    }

    /// Opaque application payload bytes, borrowed from the frame.
    pub fn payload(&self) -> Option<&'a [u8]> {
        self.raw_field(FieldTag::Payload)
    }

    /// Decode every field and validate through the generic parse path.
    ///
    /// Owned and borrowed messages validate identically because this
    /// reconstructs the generic array and hands it to [`Message::parse`].
    pub fn materialize(&self) -> ProtocolResult<Message> {
        let schema = schema(self.message_type);
        let mut wire = vec![Value::Integer(self.type_code() as i64)];

        for slot in schema.slots {
            match self.field(slot.tag)? {
                Some(value) => wire.push(value.clone()),
                None => match slot.presence {
                    SlotPresence::NullWhenAbsent => wire.push(Value::Null),
                    SlotPresence::OmitWhenAbsent => {}
                    SlotPresence::Required => {
                        return Err(ProtocolError::InvalidBinaryEnvelope {
                            reason: format!(
                                "missing required field {:?} for {}",
                                slot.tag,
                                self.name()
                            ),
                            buffer_size: self.frame.len(),
                        })
                    }
                },
            }
        }

        if schema.app_tail {
            if let Some(payload) = self.payload() {
                wire.push(Value::Bytes(payload.to_vec()));
            } else {
                if let Some(args) = self.field(FieldTag::Args)? {
                    wire.push(args.clone());
                }
                if let Some(kwargs) = self.field(FieldTag::Kwargs)? {
                    wire.push(kwargs.clone());
                }
            }
        }

        Message::parse(&wire)
    }
}

impl std::fmt::Debug for MessageView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageView")
            .field("message_type", &self.message_type)
            .field("frame_len", &self.frame.len())
            .finish()
    }
}

/// A message in either representation, behind one accessor surface.
///
/// Routing code that only needs the type code and request id can stay
/// agnostic about whether it holds a parsed message or a lazy view.
#[derive(Debug)]
pub enum AnyMessage<'a> {
    Owned(Message),
    View(MessageView<'a>),
}

impl AnyMessage<'_> {
    pub fn message_type(&self) -> MessageType {
        match self {
            AnyMessage::Owned(m) => m.message_type(),
            AnyMessage::View(v) => v.message_type(),
        }
    }

    pub fn type_code(&self) -> u8 {
        self.message_type().into()
    }

    pub fn name(&self) -> &'static str {
        self.message_type().name()
    }

    pub fn request(&self) -> ProtocolResult<Option<WampId>> {
        match self {
            AnyMessage::Owned(m) => Ok(m.request()),
            AnyMessage::View(v) => v.request(),
        }
    }

    /// Fully-validated owned message, decoding the view if needed.
    pub fn into_message(self) -> ProtocolResult<Message> {
        match self {
            AnyMessage::Owned(m) => Ok(m),
            AnyMessage::View(v) => v.materialize(),
        }
    }
}

impl From<Message> for AnyMessage<'_> {
    fn from(message: Message) -> Self {
        AnyMessage::Owned(message)
    }
}
