//! Protocol-level errors for WAMP message processing.
//!
//! Three distinguishable failure categories surface from this crate:
//!
//! - [`ProtocolError`]: a received wire message violates the protocol.
//!   Fatal — the caller must abort the session. Malformed input is never
//!   transient, so nothing here is retryable.
//! - [`InvalidUriError`] (from `wamp_types`): a URI-shaped field failed
//!   pattern validation. A refinement of protocol error, wrapped in its
//!   own variant so callers can log/report with the right category.
//! - [`SerializationError`]: the byte-level codec could not encode or
//!   decode the chosen format.
//!
//! Construction-time contract violations (e.g. building a `Call` with a
//! negative timeout) are programmer errors and panic instead of returning
//! any of these.

use thiserror::Error;

pub use wamp_types::InvalidUriError;

/// Byte-level serializer failure.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The generic-array codec could not encode the message.
    #[error("cannot encode with {serializer}: {reason}")]
    Encode { serializer: &'static str, reason: String },

    /// The generic-array codec could not decode the bytes.
    #[error("cannot decode {len} bytes with {serializer}: {reason}")]
    Decode {
        serializer: &'static str,
        len: usize,
        reason: String,
    },

    /// A payload named a serializer this build cannot decode.
    #[error("unsupported payload serializer {id:?}")]
    UnsupportedPayloadSerializer { id: String },
}

impl SerializationError {
    pub fn encode(serializer: &'static str, reason: impl ToString) -> Self {
        SerializationError::Encode {
            serializer,
            reason: reason.to_string(),
        }
    }

    pub fn decode(serializer: &'static str, len: usize, reason: impl ToString) -> Self {
        SerializationError::Decode {
            serializer,
            len,
            reason: reason.to_string(),
        }
    }
}

/// Wire message validation errors with diagnostic context.
///
/// Every variant names the message type and field that failed so a router
/// operator can tell a broken client apart from a broken serializer
/// without re-capturing traffic.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Wire array is empty or its first element is not an integer.
    #[error("invalid message envelope: {reason}")]
    InvalidEnvelope { reason: String },

    /// Leading type code is not a registered message type.
    #[error("unknown message type code {code}")]
    UnknownMessageType { code: u64 },

    /// Wire array length is outside the type's allowed length set.
    #[error("invalid array length {got} for {message} (allowed: {allowed})")]
    InvalidLength {
        message: &'static str,
        got: usize,
        allowed: &'static str,
    },

    /// A positional field or option value has the wrong type or value.
    #[error("invalid value for {field} in {message}: got {got_type} {got:?}")]
    InvalidField {
        message: &'static str,
        field: &'static str,
        got_type: &'static str,
        got: String,
    },

    /// A required field or option is missing.
    #[error("missing {field} in {message}")]
    MissingField {
        message: &'static str,
        field: &'static str,
    },

    /// A URI-shaped field failed pattern validation.
    #[error("{message}.{field}: {source}")]
    InvalidUri {
        message: &'static str,
        field: &'static str,
        source: InvalidUriError,
    },

    /// An id field is outside `[0, 2^53]` or zero where zero is invalid.
    #[error("invalid id for {field} in {message}: {reason}")]
    InvalidId {
        message: &'static str,
        field: &'static str,
        reason: String,
    },

    /// Binary envelope failed structural validation.
    #[error("invalid binary envelope: {reason} (buffer: {buffer_size} bytes)")]
    InvalidBinaryEnvelope { reason: String, buffer_size: usize },

    /// Binary envelope checksum did not match the frame contents.
    #[error(
        "binary checksum mismatch: header {expected:#010x}, calculated {calculated:#010x} \
         (frame: {frame_size} bytes)"
    )]
    ChecksumMismatch {
        expected: u32,
        calculated: u32,
        frame_size: usize,
    },

    /// A binary field entry is truncated or overruns the frame.
    #[error("truncated binary field tag {tag} at offset {offset}: need {need} bytes, frame has {have}")]
    TruncatedField {
        tag: u8,
        offset: usize,
        need: usize,
        have: usize,
    },

    /// Payload bytes could not be encoded/decoded.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl ProtocolError {
    /// Invalid positional field or option value, with the offending
    /// value's type and rendering captured for diagnostics.
    pub fn invalid_field(
        message: &'static str,
        field: &'static str,
        got: &wamp_types::Value,
    ) -> Self {
        ProtocolError::InvalidField {
            message,
            field,
            got_type: got.type_name(),
            got: render_value(got),
        }
    }

    pub fn missing_field(message: &'static str, field: &'static str) -> Self {
        ProtocolError::MissingField { message, field }
    }

    pub fn invalid_uri(
        message: &'static str,
        field: &'static str,
        source: InvalidUriError,
    ) -> Self {
        ProtocolError::InvalidUri {
            message,
            field,
            source,
        }
    }

    pub fn invalid_id(
        message: &'static str,
        field: &'static str,
        reason: impl ToString,
    ) -> Self {
        ProtocolError::InvalidId {
            message,
            field,
            reason: reason.to_string(),
        }
    }

    /// True when the failure was specifically URI pattern validation.
    pub fn is_uri_error(&self) -> bool {
        matches!(self, ProtocolError::InvalidUri { .. })
    }
}

/// Bounded rendering of an offending value for error text. Large
/// collections are summarized so a hostile peer cannot blow up log lines.
fn render_value(value: &wamp_types::Value) -> String {
    use wamp_types::Value;
    match value {
        Value::Str(s) if s.len() > 64 => {
            // back up to a char boundary so multibyte text cannot panic
            let mut cut = 64;
            while !s.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{:?}…", &s[..cut])
        }
        Value::Bytes(b) => format!("<{} bytes>", b.len()),
        Value::List(items) if items.len() > 8 => format!("<list of {}>", items.len()),
        Value::Dict(map) if map.len() > 8 => format!("<dict of {}>", map.len()),
        other => format!("{other:?}"),
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use wamp_types::Value;

    #[test]
    fn invalid_field_captures_type_and_value() {
        let err = ProtocolError::invalid_field("CALL", "procedure", &Value::Integer(7));
        let text = err.to_string();
        assert!(text.contains("CALL"));
        assert!(text.contains("procedure"));
        assert!(text.contains("integer"));
    }

    #[test]
    fn uri_errors_are_distinguishable() {
        let uri_err = wamp_types::Uri::try_new("", wamp_types::UriRules::default()).unwrap_err();
        let err = ProtocolError::invalid_uri("SUBSCRIBE", "topic", uri_err);
        assert!(err.is_uri_error());
        assert!(!ProtocolError::missing_field("SUBSCRIBE", "topic").is_uri_error());
    }

    #[test]
    fn render_value_bounds_large_inputs() {
        let huge = Value::Str("x".repeat(500));
        let err = ProtocolError::invalid_field("HELLO", "realm", &huge);
        assert!(err.to_string().len() < 200);
    }

    #[test]
    fn render_value_truncates_multibyte_text_on_char_boundary() {
        // 2-byte char straddling the truncation point
        let mut text = "x".repeat(63);
        text.push_str("ééé");
        let err = ProtocolError::invalid_field("PUBLISH", "retain", &Value::Str(text));
        assert!(err.to_string().contains('…'));
    }
}
