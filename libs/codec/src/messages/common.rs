//! Cross-cutting message extensions: application payload and forwarding.
//!
//! The seven data-plane types embed [`AppPayload`] by value and the
//! forwardable types carry a `forward_for` chain; the validation and wire
//! mapping for both live here exactly once.

use wamp_types::{Dict, PayloadEncAlgo, PayloadSerializerId, Principal, Value};

use crate::error::{ProtocolError, ProtocolResult};
use crate::validation::{check_or_raise_extra, OptionReader};

/// Application payload carried by the data-plane message types.
///
/// Two mutually exclusive modes:
/// - **structured**: `args` (ordered list) and/or `kwargs` (string-keyed
///   map), transparent to the router;
/// - **opaque**: `payload` bytes the router forwards without decoding,
///   optionally end-to-end encrypted as described by the `enc_*` fields.
///
/// Invariants are checked at construction and are programmer errors when
/// violated, so the checks panic rather than return `Err`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppPayload {
    pub args: Option<Vec<Value>>,
    pub kwargs: Option<Dict>,
    pub payload: Option<Vec<u8>>,
    pub enc_algo: Option<PayloadEncAlgo>,
    pub enc_key: Option<String>,
    pub enc_serializer: Option<PayloadSerializerId>,
}

impl AppPayload {
    /// Structured-mode payload.
    ///
    /// An empty args list is canonicalized to absent: the wire form for
    /// kwargs-only payloads carries an empty args slot, so both sides of
    /// the round trip must agree on one representation.
    pub fn structured(args: Option<Vec<Value>>, kwargs: Option<Dict>) -> Self {
        AppPayload {
            args: args.filter(|items| !items.is_empty()),
            kwargs,
            ..AppPayload::default()
        }
    }

    /// Opaque-mode payload with optional encryption metadata.
    pub fn opaque(
        payload: Vec<u8>,
        enc_algo: Option<PayloadEncAlgo>,
        enc_key: Option<String>,
        enc_serializer: Option<PayloadSerializerId>,
    ) -> Self {
        let this = AppPayload {
            args: None,
            kwargs: None,
            payload: Some(payload),
            enc_algo,
            enc_key,
            enc_serializer,
        };
        this.assert_valid();
        this
    }

    /// Panics when the mutual-exclusivity or encryption-metadata
    /// invariants are violated. Called by every data-plane constructor.
    pub fn assert_valid(&self) {
        if self.payload.is_some() {
            assert!(
                self.args.is_none() && self.kwargs.is_none(),
                "payload is mutually exclusive with args/kwargs"
            );
        }
        if self.enc_algo.is_some() || self.enc_key.is_some() || self.enc_serializer.is_some() {
            assert!(
                self.payload.is_some() && self.enc_algo.is_some(),
                "enc_algo/enc_key/enc_serializer require payload and a non-null enc_algo"
            );
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.payload.is_some()
    }

    /// Parse the trailing wire slots of a data-plane array.
    ///
    /// `tail` holds the elements after the fixed positional fields: zero,
    /// one (args or opaque payload) or two (args + kwargs). The `enc_*`
    /// metadata travels in the options/details map and is read through
    /// `reader`.
    pub fn parse(
        message: &'static str,
        tail: &[Value],
        reader: &OptionReader<'_>,
    ) -> ProtocolResult<Self> {
        match tail {
            [] => Ok(AppPayload::default()),
            [Value::Bytes(payload)] => {
                let enc_algo = reader.enum_opt("enc_algo", PayloadEncAlgo::from_str)?;
                let enc_serializer =
                    reader.enum_opt("enc_serializer", PayloadSerializerId::from_str)?;
                let enc_key = reader.string_opt("enc_key")?;
                if enc_algo.is_none() && (enc_key.is_some() || enc_serializer.is_some()) {
                    return Err(ProtocolError::missing_field(message, "enc_algo"));
                }
                Ok(AppPayload {
                    args: None,
                    kwargs: None,
                    payload: Some(payload.clone()),
                    enc_algo,
                    enc_key,
                    enc_serializer,
                })
            }
            [args] => {
                let args = match args {
                    Value::List(items) => items.clone(),
                    other => return Err(ProtocolError::invalid_field(message, "args", other)),
                };
                Ok(AppPayload::structured(Some(args), None))
            }
            [args, kwargs] => {
                let args = match args {
                    Value::List(items) => items.clone(),
                    other => return Err(ProtocolError::invalid_field(message, "args", other)),
                };
                let kwargs = check_or_raise_extra(message, "kwargs", kwargs)?;
                Ok(AppPayload::structured(Some(args), Some(kwargs)))
            }
            _ => unreachable!("length validated by caller"),
        }
    }

    /// Append the trailing wire slots to a marshalled array and, in
    /// opaque mode, fold the `enc_*` metadata into the options map.
    pub fn marshal_into(&self, wire: &mut Vec<Value>, options: &mut Dict) {
        if let Some(payload) = &self.payload {
            if let Some(algo) = &self.enc_algo {
                options.insert("enc_algo".into(), Value::from(algo.as_str()));
            }
            if let Some(key) = &self.enc_key {
                options.insert("enc_key".into(), Value::from(key.as_str()));
            }
            if let Some(ser) = &self.enc_serializer {
                options.insert("enc_serializer".into(), Value::from(ser.as_str()));
            }
            wire.push(Value::Bytes(payload.clone()));
            return;
        }

        match (&self.args, &self.kwargs) {
            (None, None) => {}
            (Some(args), None) => {
                wire.push(Value::List(args.clone()));
            }
            (args, Some(kwargs)) => {
                // kwargs require an args slot on the wire, empty if unset
                wire.push(Value::List(args.clone().unwrap_or_default()));
                wire.push(Value::Dict(kwargs.clone()));
            }
        }
    }
}

/// Validate a wire array's length against the type's allowed length set.
pub fn expect_length(
    message: &'static str,
    wmsg: &[Value],
    allowed: &[usize],
    allowed_desc: &'static str,
) -> ProtocolResult<()> {
    if !allowed.contains(&wmsg.len()) {
        return Err(ProtocolError::InvalidLength {
            message,
            got: wmsg.len(),
            allowed: allowed_desc,
        });
    }
    Ok(())
}

/// Marshal a forwarding chain into the options/details map.
pub fn marshal_forward_for(chain: &[Principal], options: &mut Dict) {
    if chain.is_empty() {
        return;
    }
    let items = chain
        .iter()
        .map(|hop| {
            let mut map = Dict::new();
            map.insert("session".into(), Value::from(hop.session.into_raw()));
            match &hop.authid {
                Some(authid) => map.insert("authid".into(), Value::from(authid.as_str())),
                None => map.insert("authid".into(), Value::Null),
            };
            map.insert("authrole".into(), Value::from(hop.authrole.as_str()));
            Value::Dict(map)
        })
        .collect();
    options.insert("forward_for".into(), Value::List(items));
}

#[cfg(test)]
mod tests {
    use super::*;
    use wamp_types::WampId;

    #[test]
    #[should_panic(expected = "mutually exclusive")]
    fn payload_excludes_args() {
        let payload = AppPayload {
            args: Some(vec![Value::Integer(1)]),
            payload: Some(vec![0u8; 4]),
            ..AppPayload::default()
        };
        payload.assert_valid();
    }

    #[test]
    #[should_panic(expected = "require payload")]
    fn enc_algo_requires_payload() {
        let payload = AppPayload {
            enc_algo: Some(PayloadEncAlgo::Cryptobox),
            ..AppPayload::default()
        };
        payload.assert_valid();
    }

    #[test]
    fn kwargs_without_args_roundtrip_through_empty_args_slot() {
        let mut kwargs = Dict::new();
        kwargs.insert("k".into(), Value::Integer(1));
        let payload = AppPayload::structured(None, Some(kwargs));

        let mut wire = Vec::new();
        let mut options = Dict::new();
        payload.marshal_into(&mut wire, &mut options);

        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0], Value::List(vec![]));

        let reader = OptionReader::new("PUBLISH", &options);
        let parsed = AppPayload::parse("PUBLISH", &wire, &reader).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn empty_args_list_canonicalizes_to_absent() {
        assert_eq!(
            AppPayload::structured(Some(vec![]), None),
            AppPayload::default()
        );

        let kwargs: Dict = [("k".to_string(), Value::Integer(1))].into();
        assert_eq!(
            AppPayload::structured(Some(vec![]), Some(kwargs.clone())),
            AppPayload::structured(None, Some(kwargs))
        );
    }

    #[test]
    fn opaque_marshal_folds_enc_metadata_into_options() {
        let payload = AppPayload::opaque(
            vec![1, 2, 3],
            Some(PayloadEncAlgo::Cryptobox),
            Some("pubkey".into()),
            Some(PayloadSerializerId::Cbor),
        );

        let mut wire = Vec::new();
        let mut options = Dict::new();
        payload.marshal_into(&mut wire, &mut options);

        assert_eq!(wire, vec![Value::Bytes(vec![1, 2, 3])]);
        assert_eq!(options.get("enc_algo"), Some(&Value::from("cryptobox")));
        assert_eq!(options.get("enc_serializer"), Some(&Value::from("cbor")));
    }

    #[test]
    fn forward_for_marshals_all_three_keys() {
        let chain = vec![Principal::new(WampId::try_new(7).unwrap(), None, "router")];
        let mut options = Dict::new();
        marshal_forward_for(&chain, &mut options);

        let list = options.get("forward_for").and_then(Value::as_list).unwrap();
        let hop = list[0].as_dict().unwrap();
        assert_eq!(hop.get("session"), Some(&Value::Integer(7)));
        assert_eq!(hop.get("authid"), Some(&Value::Null));
        assert_eq!(hop.get("authrole"), Some(&Value::from("router")));
    }
}
