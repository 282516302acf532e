//! Byte-level serializers for the two wire encoding families.
//!
//! The array family (JSON, MessagePack, CBOR) encodes the generic
//! marshalled array; the three formats are interchangeable because they
//! all round-trip the [`Value`] model. The binary family encodes through
//! the zero-copy envelope in [`crate::binary`] and names a payload
//! sub-serializer for composite fields.
//!
//! JSON has no native binary type, so `Value::Bytes` crosses JSON as a
//! NUL-prefixed base64 string and is restored on decode. Application
//! strings never start with NUL, which makes the prefix unambiguous.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use wamp_types::{PayloadSerializerId, Value};

use crate::error::SerializationError;
use crate::messages::Message;

/// A concrete wire-byte codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Serializer {
    Json,
    Msgpack,
    Cbor,
    /// Zero-copy binary envelope; composite fields are sub-serialized
    /// with `payload`.
    Binary { payload: PayloadSerializerId },
}

/// Stable serializer identity, used as the encoding-cache key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SerializerId {
    Json,
    Msgpack,
    Cbor,
    Binary(String),
}

impl fmt::Display for SerializerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializerId::Json => f.write_str("json"),
            SerializerId::Msgpack => f.write_str("msgpack"),
            SerializerId::Cbor => f.write_str("cbor"),
            SerializerId::Binary(payload) => write!(f, "binary+{payload}"),
        }
    }
}

impl Serializer {
    pub fn id(&self) -> SerializerId {
        match self {
            Serializer::Json => SerializerId::Json,
            Serializer::Msgpack => SerializerId::Msgpack,
            Serializer::Cbor => SerializerId::Cbor,
            Serializer::Binary { payload } => SerializerId::Binary(payload.as_str().to_string()),
        }
    }

    /// True for the zero-copy binary envelope family.
    pub fn is_binary(&self) -> bool {
        matches!(self, Serializer::Binary { .. })
    }

    /// Encode a message to wire bytes through this serializer's family.
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, SerializationError> {
        match self {
            Serializer::Binary { payload } => crate::binary::build(message, payload),
            _ => self.serialize_array(&message.marshal()),
        }
    }

    /// Encode an already-marshalled generic array (array family only).
    pub fn serialize_array(&self, values: &[Value]) -> Result<Vec<u8>, SerializationError> {
        match self {
            Serializer::Json => {
                let safe: Vec<Value> = values.iter().map(bytes_to_json).collect();
                serde_json::to_vec(&safe).map_err(|e| SerializationError::encode("json", e))
            }
            Serializer::Msgpack => {
                rmp_serde::to_vec(values).map_err(|e| SerializationError::encode("msgpack", e))
            }
            Serializer::Cbor => {
                let mut buf = Vec::new();
                ciborium::ser::into_writer(&values, &mut buf)
                    .map_err(|e| SerializationError::encode("cbor", e))?;
                Ok(buf)
            }
            Serializer::Binary { .. } => Err(SerializationError::encode(
                "binary",
                "binary family has no generic-array form",
            )),
        }
    }

    /// Decode wire bytes to the generic array (array family only).
    pub fn unserialize_array(&self, bytes: &[u8]) -> Result<Vec<Value>, SerializationError> {
        match self {
            Serializer::Json => {
                let values: Vec<Value> = serde_json::from_slice(bytes)
                    .map_err(|e| SerializationError::decode("json", bytes.len(), e))?;
                values
                    .into_iter()
                    .map(|v| json_to_bytes(v, bytes.len()))
                    .collect()
            }
            Serializer::Msgpack => rmp_serde::from_slice(bytes)
                .map_err(|e| SerializationError::decode("msgpack", bytes.len(), e)),
            Serializer::Cbor => ciborium::de::from_reader(bytes)
                .map_err(|e| SerializationError::decode("cbor", bytes.len(), e)),
            Serializer::Binary { .. } => Err(SerializationError::decode(
                "binary",
                bytes.len(),
                "binary family has no generic-array form",
            )),
        }
    }
}

/// Replace `Bytes` with the NUL-prefixed base64 string JSON can carry.
fn bytes_to_json(value: &Value) -> Value {
    match value {
        Value::Bytes(b) => Value::Str(format!("\0{}", BASE64.encode(b))),
        Value::List(items) => Value::List(items.iter().map(bytes_to_json).collect()),
        Value::Dict(map) => Value::Dict(
            map.iter()
                .map(|(k, v)| (k.clone(), bytes_to_json(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Restore NUL-prefixed base64 strings to `Bytes` after JSON decode.
fn json_to_bytes(value: Value, frame_len: usize) -> Result<Value, SerializationError> {
    Ok(match value {
        Value::Str(s) if s.starts_with('\0') => {
            let decoded = BASE64
                .decode(&s.as_bytes()[1..])
                .map_err(|e| SerializationError::decode("json", frame_len, e))?;
            Value::Bytes(decoded)
        }
        Value::List(items) => Value::List(
            items
                .into_iter()
                .map(|v| json_to_bytes(v, frame_len))
                .collect::<Result<_, _>>()?,
        ),
        Value::Dict(map) => Value::Dict(
            map.into_iter()
                .map(|(k, v)| json_to_bytes(v, frame_len).map(|v| (k, v)))
                .collect::<Result<_, _>>()?,
        ),
        other => other,
    })
}

/// Encode one composite field with the named payload sub-serializer.
/// CBOR is the fallback when no `enc_serializer` was given.
pub(crate) fn encode_payload_value(
    id: Option<&PayloadSerializerId>,
    value: &Value,
) -> Result<Vec<u8>, SerializationError> {
    match id.unwrap_or(&PayloadSerializerId::Cbor) {
        PayloadSerializerId::Json => Serializer::Json.serialize_array(std::slice::from_ref(value)),
        PayloadSerializerId::Msgpack => {
            rmp_serde::to_vec(value).map_err(|e| SerializationError::encode("msgpack", e))
        }
        PayloadSerializerId::Cbor => {
            let mut buf = Vec::new();
            ciborium::ser::into_writer(value, &mut buf)
                .map_err(|e| SerializationError::encode("cbor", e))?;
            Ok(buf)
        }
        PayloadSerializerId::Custom(name) => Err(SerializationError::UnsupportedPayloadSerializer {
            id: name.clone(),
        }),
    }
}

/// Decode one composite field with the named payload sub-serializer.
pub(crate) fn decode_payload_value(
    id: Option<&PayloadSerializerId>,
    bytes: &[u8],
) -> Result<Value, SerializationError> {
    match id.unwrap_or(&PayloadSerializerId::Cbor) {
        PayloadSerializerId::Json => {
            let mut values = Serializer::Json.unserialize_array(bytes)?;
            match values.len() {
                1 => Ok(values.remove(0)),
                n => Err(SerializationError::decode(
                    "json",
                    bytes.len(),
                    format!("expected one payload value, got {n}"),
                )),
            }
        }
        PayloadSerializerId::Msgpack => rmp_serde::from_slice(bytes)
            .map_err(|e| SerializationError::decode("msgpack", bytes.len(), e)),
        PayloadSerializerId::Cbor => ciborium::de::from_reader(bytes)
            .map_err(|e| SerializationError::decode("cbor", bytes.len(), e)),
        PayloadSerializerId::Custom(name) => Err(SerializationError::UnsupportedPayloadSerializer {
            id: name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wamp_types::Dict;

    fn sample_array() -> Vec<Value> {
        let mut options = Dict::new();
        options.insert("acknowledge".into(), Value::Bool(true));
        vec![
            Value::Integer(16),
            Value::Integer(239714735),
            Value::Dict(options),
            Value::from("com.myapp.topic1"),
            Value::List(vec![Value::from("hello"), Value::Double(1.5)]),
        ]
    }

    #[test]
    fn array_family_roundtrips_identically() {
        let array = sample_array();
        for serializer in [Serializer::Json, Serializer::Msgpack, Serializer::Cbor] {
            let bytes = serializer.serialize_array(&array).unwrap();
            assert_eq!(serializer.unserialize_array(&bytes).unwrap(), array);
        }
    }

    #[test]
    fn json_carries_bytes_as_nul_prefixed_base64() {
        let array = vec![Value::Integer(48), Value::Bytes(vec![0xde, 0xad])];
        let bytes = Serializer::Json.serialize_array(&array).unwrap();

        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("\\u0000"));
        assert_eq!(Serializer::Json.unserialize_array(&bytes).unwrap(), array);
    }

    #[test]
    fn msgpack_keeps_bytes_native() {
        let array = vec![Value::Bytes(vec![1, 2, 3])];
        let bytes = Serializer::Msgpack.serialize_array(&array).unwrap();
        assert_eq!(Serializer::Msgpack.unserialize_array(&bytes).unwrap(), array);
    }

    #[test]
    fn serializer_ids_are_distinct_cache_keys() {
        let binary = Serializer::Binary {
            payload: PayloadSerializerId::Cbor,
        };
        let ids = [
            Serializer::Json.id(),
            Serializer::Msgpack.id(),
            Serializer::Cbor.id(),
            binary.id(),
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(binary.id().to_string(), "binary+cbor");
    }

    #[test]
    fn payload_sub_serializer_defaults_to_cbor() {
        let value = Value::List(vec![Value::Integer(2), Value::Integer(3)]);
        let bytes = encode_payload_value(None, &value).unwrap();
        assert_eq!(decode_payload_value(None, &bytes).unwrap(), value);
    }

    #[test]
    fn custom_payload_serializer_is_rejected() {
        let id = PayloadSerializerId::Custom("x_flat".into());
        let err = encode_payload_value(Some(&id), &Value::Null).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::UnsupportedPayloadSerializer { .. }
        ));
    }

    #[test]
    fn truncated_input_fails_decode() {
        let array = sample_array();
        for serializer in [Serializer::Json, Serializer::Msgpack, Serializer::Cbor] {
            let bytes = serializer.serialize_array(&array).unwrap();
            assert!(serializer.unserialize_array(&bytes[..bytes.len() / 2]).is_err());
        }
    }
}
