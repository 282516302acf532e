//! Field tag registry and per-type slot schemas for the binary encoding.
//!
//! Every field entry in a binary frame is tagged with a [`FieldTag`]
//! drawn from one closed registry shared by all message types. The tag
//! alone determines how the bytes decode (id, UTF-8 string, raw bytes,
//! or a sub-serialized composite), so a view can decode any field
//! without consulting the message schema.
//!
//! The per-type [`Schema`] maps the binary fields back onto the generic
//! array slot order, which is what lets `materialize` route through the
//! same `parse` path the array encodings use.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::messages::MessageType;

/// Binary field tags. Stable wire values; never reuse a retired tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FieldTag {
    Realm = 1,
    Session = 2,
    Details = 3,
    Options = 4,
    Extra = 5,
    Reason = 6,
    Method = 7,
    Signature = 8,
    RequestType = 9,
    Request = 10,
    ErrorUri = 11,
    Topic = 12,
    Subscription = 13,
    Publication = 14,
    Procedure = 15,
    Registration = 16,
    Args = 17,
    Kwargs = 18,
    Payload = 19,
}

/// One more than the highest tag value; sizes the view's slot tables.
pub const TAG_SLOTS: usize = 20;

impl FieldTag {
    /// How this tag's bytes decode, independent of message type.
    pub fn kind(self) -> FieldKind {
        match self {
            FieldTag::Session
            | FieldTag::RequestType
            | FieldTag::Request
            | FieldTag::Subscription
            | FieldTag::Publication
            | FieldTag::Registration => FieldKind::Id,
            FieldTag::Realm
            | FieldTag::Reason
            | FieldTag::Method
            | FieldTag::Signature
            | FieldTag::ErrorUri
            | FieldTag::Topic
            | FieldTag::Procedure => FieldKind::Text,
            FieldTag::Details | FieldTag::Options | FieldTag::Extra | FieldTag::Kwargs => {
                FieldKind::Composite
            }
            FieldTag::Args => FieldKind::Composite,
            FieldTag::Payload => FieldKind::Raw,
        }
    }
}

/// Byte-level decoding discipline of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 8 bytes, u64 little-endian.
    Id,
    /// UTF-8 string (uris, auth methods, signatures).
    Text,
    /// Sub-serialized with the frame's payload serializer.
    Composite,
    /// Raw bytes, forwarded without decoding.
    Raw,
}

/// How a fixed array slot tolerates absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPresence {
    Required,
    /// Missing on the wire means `null` in the array slot (`Hello.realm`).
    NullWhenAbsent,
    /// Missing on the wire shortens the array (trailing optional dict).
    OmitWhenAbsent,
}

/// One fixed positional slot of a message's generic array form.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub tag: FieldTag,
    pub presence: SlotPresence,
}

const fn req(tag: FieldTag) -> Slot {
    Slot {
        tag,
        presence: SlotPresence::Required,
    }
}

const fn nullable(tag: FieldTag) -> Slot {
    Slot {
        tag,
        presence: SlotPresence::NullWhenAbsent,
    }
}

const fn trailing(tag: FieldTag) -> Slot {
    Slot {
        tag,
        presence: SlotPresence::OmitWhenAbsent,
    }
}

/// A message type's generic-array layout after the type code.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub slots: &'static [Slot],
    /// Whether the type carries the args/kwargs/payload application tail.
    pub app_tail: bool,
}

const fn plain(slots: &'static [Slot]) -> Schema {
    Schema {
        slots,
        app_tail: false,
    }
}

const fn with_tail(slots: &'static [Slot]) -> Schema {
    Schema {
        slots,
        app_tail: true,
    }
}

/// Slot schema for each message type, in generic-array order.
///
/// The slot lists are named `const` items so each `&'static [Slot]`
/// reference points at baked-in data rather than a temporary.
pub fn schema(message_type: MessageType) -> Schema {
    use FieldTag::*;

    const REALM_DETAILS: &[Slot] = &[nullable(Realm), req(Details)];
    const SESSION_DETAILS: &[Slot] = &[req(Session), req(Details)];
    const DETAILS_REASON: &[Slot] = &[req(Details), req(Reason)];
    const METHOD_EXTRA: &[Slot] = &[req(Method), req(Extra)];
    const SIGNATURE_EXTRA: &[Slot] = &[req(Signature), req(Extra)];
    const ERROR: &[Slot] = &[req(RequestType), req(Request), req(Details), req(ErrorUri)];
    const REQUEST_OPTIONS_TOPIC: &[Slot] = &[req(Request), req(Options), req(Topic)];
    const REQUEST_OPTIONS_PROCEDURE: &[Slot] = &[req(Request), req(Options), req(Procedure)];
    const REQUEST_OPTIONS: &[Slot] = &[req(Request), req(Options)];
    const REQUEST_DETAILS: &[Slot] = &[req(Request), req(Details)];
    const REQUEST_PUBLICATION: &[Slot] = &[req(Request), req(Publication)];
    const REQUEST_SUBSCRIPTION: &[Slot] = &[req(Request), req(Subscription)];
    const REQUEST_REGISTRATION: &[Slot] = &[req(Request), req(Registration)];
    const UNSUBSCRIBE: &[Slot] = &[req(Request), req(Subscription), trailing(Options)];
    const UNREGISTER: &[Slot] = &[req(Request), req(Registration), trailing(Options)];
    const REQUEST_TRAILING_DETAILS: &[Slot] = &[req(Request), trailing(Details)];
    const EVENT: &[Slot] = &[req(Subscription), req(Publication), req(Details)];
    const PUBLICATION: &[Slot] = &[req(Publication)];
    const INVOCATION: &[Slot] = &[req(Request), req(Registration), req(Details)];

    match message_type {
        MessageType::Hello => plain(REALM_DETAILS),
        MessageType::Welcome => plain(SESSION_DETAILS),
        MessageType::Abort => plain(DETAILS_REASON),
        MessageType::Challenge => plain(METHOD_EXTRA),
        MessageType::Authenticate => plain(SIGNATURE_EXTRA),
        MessageType::Goodbye => plain(DETAILS_REASON),
        MessageType::Error => with_tail(ERROR),
        MessageType::Publish => with_tail(REQUEST_OPTIONS_TOPIC),
        MessageType::Published => plain(REQUEST_PUBLICATION),
        MessageType::Subscribe => plain(REQUEST_OPTIONS_TOPIC),
        MessageType::Subscribed => plain(REQUEST_SUBSCRIPTION),
        MessageType::Unsubscribe => plain(UNSUBSCRIBE),
        MessageType::Unsubscribed => plain(REQUEST_TRAILING_DETAILS),
        MessageType::Event => with_tail(EVENT),
        MessageType::EventReceived => plain(PUBLICATION),
        MessageType::Call => with_tail(REQUEST_OPTIONS_PROCEDURE),
        MessageType::Cancel => plain(REQUEST_OPTIONS),
        MessageType::Result => with_tail(REQUEST_DETAILS),
        MessageType::Register => plain(REQUEST_OPTIONS_PROCEDURE),
        MessageType::Registered => plain(REQUEST_REGISTRATION),
        MessageType::Unregister => plain(UNREGISTER),
        MessageType::Unregistered => plain(REQUEST_TRAILING_DETAILS),
        MessageType::Invocation => with_tail(INVOCATION),
        MessageType::Interrupt => plain(REQUEST_OPTIONS),
        MessageType::Yield => with_tail(REQUEST_OPTIONS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_fit_slot_table() {
        for raw in 0..=u8::MAX {
            if let Ok(tag) = FieldTag::try_from(raw) {
                assert!((raw as usize) < TAG_SLOTS, "tag {tag:?} overflows slot table");
            }
        }
    }

    #[test]
    fn trailing_slots_are_last() {
        for code in [
            MessageType::Hello,
            MessageType::Unsubscribe,
            MessageType::Unsubscribed,
            MessageType::Unregister,
            MessageType::Unregistered,
            MessageType::Call,
            MessageType::Yield,
        ] {
            let schema = schema(code);
            for (i, slot) in schema.slots.iter().enumerate() {
                if slot.presence == SlotPresence::OmitWhenAbsent {
                    assert_eq!(i, schema.slots.len() - 1, "{code:?}");
                }
            }
        }
    }

    #[test]
    fn data_plane_types_carry_app_tail() {
        for code in [
            MessageType::Error,
            MessageType::Publish,
            MessageType::Event,
            MessageType::Call,
            MessageType::Result,
            MessageType::Invocation,
            MessageType::Yield,
        ] {
            assert!(schema(code).app_tail, "{code:?}");
        }
        assert!(!schema(MessageType::Subscribe).app_tail);
    }
}
