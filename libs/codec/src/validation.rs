//! Field validation primitives shared by every message type.
//!
//! Each `check_or_raise_*` function validates one generic-array slot and
//! fails with a [`ProtocolError`] carrying the message-type name, field
//! name and offending value. The per-type `parse` implementations are
//! thin sequences of these calls, so the seven data-plane types and the
//! control types all enforce identical rules without duplicating them.

use tracing::debug;
use wamp_types::{
    is_custom_identifier, Dict, Principal, Uri, UriRules, Value, WampId,
};

use crate::error::{ProtocolError, ProtocolResult};

/// Validate a URI-shaped slot.
///
/// `rules` selects the strictness and empty-component pattern (derived
/// from the message's matching policy); `allow_none` admits `null` where
/// the protocol permits omission (e.g. anonymous realm in `Hello`).
pub fn check_or_raise_uri(
    message: &'static str,
    field: &'static str,
    value: &Value,
    rules: UriRules,
    allow_none: bool,
) -> ProtocolResult<Option<Uri>> {
    match value {
        Value::Null if allow_none => Ok(None),
        Value::Str(s) => Uri::try_new(s.clone(), rules)
            .map(Some)
            .map_err(|e| ProtocolError::invalid_uri(message, field, e)),
        other => Err(ProtocolError::invalid_field(message, field, other)),
    }
}

/// Validate a URI-shaped slot that admits no omission.
pub fn check_or_raise_required_uri(
    message: &'static str,
    field: &'static str,
    value: &Value,
    rules: UriRules,
) -> ProtocolResult<Uri> {
    check_or_raise_uri(message, field, value, rules, false)?
        .ok_or_else(|| ProtocolError::missing_field(message, field))
}

/// Validate an id slot: an integer in `[0, 2^53]`.
pub fn check_or_raise_id(
    message: &'static str,
    field: &'static str,
    value: &Value,
) -> ProtocolResult<WampId> {
    match value {
        Value::Integer(_) | Value::UInteger(_) => {
            let raw = match value {
                Value::Integer(v) => {
                    if *v < 0 {
                        return Err(ProtocolError::invalid_id(
                            message,
                            field,
                            format!("{v} is negative"),
                        ));
                    }
                    *v as u64
                }
                Value::UInteger(v) => *v,
                _ => unreachable!(),
            };
            WampId::try_new(raw)
                .map_err(|e| ProtocolError::invalid_id(message, field, e))
        }
        other => Err(ProtocolError::invalid_field(message, field, other)),
    }
}

/// Validate an id slot that additionally must not be zero (a live
/// request id, as opposed to the router-initiated revocation sentinel).
pub fn check_or_raise_nonzero_id(
    message: &'static str,
    field: &'static str,
    value: &Value,
) -> ProtocolResult<WampId> {
    let id = check_or_raise_id(message, field, value)?;
    if id.is_zero() {
        return Err(ProtocolError::invalid_id(
            message,
            field,
            "zero is reserved for router-initiated messages",
        ));
    }
    Ok(id)
}

/// Validate an options/details/extra slot: a string-keyed map.
///
/// Key typing is structural in [`Value`] — a wire map with a non-string
/// key already fails byte-level decoding — so this checks the slot is a
/// map at all and clones it out.
pub fn check_or_raise_extra(
    message: &'static str,
    field: &'static str,
    value: &Value,
) -> ProtocolResult<Dict> {
    match value {
        Value::Dict(map) => Ok(map.clone()),
        other => Err(ProtocolError::invalid_field(message, field, other)),
    }
}

/// Validate a plain string slot.
pub fn check_or_raise_string(
    message: &'static str,
    field: &'static str,
    value: &Value,
) -> ProtocolResult<String> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(ProtocolError::invalid_field(message, field, other)),
    }
}

/// Validate one `forward_for` element: `{session, authid, authrole}`.
pub fn check_or_raise_principal(
    message: &'static str,
    field: &'static str,
    value: &Value,
) -> ProtocolResult<Principal> {
    let map = match value {
        Value::Dict(map) => map,
        other => return Err(ProtocolError::invalid_field(message, field, other)),
    };

    let session = map
        .get("session")
        .ok_or_else(|| ProtocolError::missing_field(message, field))?;
    let session = check_or_raise_id(message, field, session)?;

    let authid = match map.get("authid") {
        None | Some(Value::Null) => None,
        Some(Value::Str(s)) => Some(s.clone()),
        Some(other) => return Err(ProtocolError::invalid_field(message, field, other)),
    };

    let authrole = match map.get("authrole") {
        Some(Value::Str(s)) => s.clone(),
        Some(other) => return Err(ProtocolError::invalid_field(message, field, other)),
        None => return Err(ProtocolError::missing_field(message, field)),
    };

    Ok(Principal {
        session,
        authid,
        authrole,
    })
}

/// Validate a complete `forward_for` chain.
pub fn check_or_raise_forward_for(
    message: &'static str,
    value: &Value,
) -> ProtocolResult<Vec<Principal>> {
    let items = match value {
        Value::List(items) => items,
        other => {
            return Err(ProtocolError::invalid_field(message, "forward_for", other));
        }
    };
    items
        .iter()
        .map(|item| check_or_raise_principal(message, "forward_for", item))
        .collect()
}

/// Typed reader over a received options/details map.
///
/// Every getter attaches the message name and option key to its error.
/// After the known keys are read, [`OptionReader::take_custom`] splits
/// off the `x_*` extension keys (kept verbatim for round-tripping) and
/// logs any remaining unrecognized keys.
pub struct OptionReader<'a> {
    message: &'static str,
    dict: &'a Dict,
}

impl<'a> OptionReader<'a> {
    pub fn new(message: &'static str, dict: &'a Dict) -> Self {
        OptionReader { message, dict }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.dict.get(key)
    }

    pub fn bool_opt(&self, key: &'static str) -> ProtocolResult<Option<bool>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(Value::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(ProtocolError::invalid_field(self.message, key, other)),
        }
    }

    pub fn string_opt(&self, key: &'static str) -> ProtocolResult<Option<String>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ProtocolError::invalid_field(self.message, key, other)),
        }
    }

    pub fn dict_opt(&self, key: &'static str) -> ProtocolResult<Option<Dict>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(Value::Dict(map)) => Ok(Some(map.clone())),
            Some(other) => Err(ProtocolError::invalid_field(self.message, key, other)),
        }
    }

    pub fn id_opt(&self, key: &'static str) -> ProtocolResult<Option<WampId>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(value) => check_or_raise_id(self.message, key, value).map(Some),
        }
    }

    pub fn uri_opt(&self, key: &'static str, rules: UriRules) -> ProtocolResult<Option<Uri>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(value) => check_or_raise_uri(self.message, key, value, rules, false),
        }
    }

    /// Non-negative integer option (e.g. `Call.timeout`).
    pub fn non_negative_int_opt(&self, key: &'static str) -> ProtocolResult<Option<u64>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| ProtocolError::invalid_field(self.message, key, value))
                .map(Some),
        }
    }

    /// Strictly positive integer option (e.g. `Register.concurrency`).
    pub fn positive_int_opt(&self, key: &'static str) -> ProtocolResult<Option<u64>> {
        match self.non_negative_int_opt(key)? {
            Some(0) => Err(ProtocolError::invalid_field(
                self.message,
                key,
                &Value::Integer(0),
            )),
            other => Ok(other),
        }
    }

    pub fn id_list_opt(&self, key: &'static str) -> ProtocolResult<Option<Vec<WampId>>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| check_or_raise_id(self.message, key, item))
                .collect::<ProtocolResult<Vec<_>>>()
                .map(Some),
            Some(other) => Err(ProtocolError::invalid_field(self.message, key, other)),
        }
    }

    pub fn string_list_opt(&self, key: &'static str) -> ProtocolResult<Option<Vec<String>>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| check_or_raise_string(self.message, key, item))
                .collect::<ProtocolResult<Vec<_>>>()
                .map(Some),
            Some(other) => Err(ProtocolError::invalid_field(self.message, key, other)),
        }
    }

    /// Closed-set string option decoded through a registry parser
    /// (e.g. `match`, `invoke`, `mode`).
    pub fn enum_opt<T>(
        &self,
        key: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> ProtocolResult<Option<T>> {
        match self.dict.get(key) {
            None => Ok(None),
            Some(value @ Value::Str(s)) => parse(s)
                .ok_or_else(|| ProtocolError::invalid_field(self.message, key, value))
                .map(Some),
            Some(other) => Err(ProtocolError::invalid_field(self.message, key, other)),
        }
    }

    pub fn forward_for_opt(&self) -> ProtocolResult<Option<Vec<Principal>>> {
        match self.dict.get("forward_for") {
            None => Ok(None),
            Some(value) => check_or_raise_forward_for(self.message, value).map(Some),
        }
    }

    /// Split off `x_*` extension keys; log and drop anything else that
    /// was not in `recognized`.
    pub fn take_custom(&self, recognized: &[&str]) -> Dict {
        let mut custom = Dict::new();
        for (key, value) in self.dict {
            if recognized.contains(&key.as_str()) {
                continue;
            }
            if is_custom_identifier(key) {
                custom.insert(key.clone(), value.clone());
            } else {
                debug!(message = self.message, key = %key, "ignoring unrecognized option key");
            }
        }
        custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, Value)]) -> Dict {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn id_bounds_enforced() {
        assert!(check_or_raise_id("CALL", "request", &Value::Integer(0)).is_ok());
        assert!(
            check_or_raise_id("CALL", "request", &Value::UInteger(WampId::MAX)).is_ok()
        );
        assert!(
            check_or_raise_id("CALL", "request", &Value::UInteger(WampId::MAX + 1)).is_err()
        );
        assert!(check_or_raise_id("CALL", "request", &Value::Integer(-1)).is_err());
        assert!(check_or_raise_id("CALL", "request", &Value::Str("1".into())).is_err());
    }

    #[test]
    fn nonzero_id_rejects_sentinel() {
        let err =
            check_or_raise_nonzero_id("CALL", "request", &Value::Integer(0)).unwrap_err();
        assert!(err.to_string().contains("router-initiated"));
    }

    #[test]
    fn uri_allow_none_gate() {
        let rules = UriRules::default();
        assert_eq!(
            check_or_raise_uri("HELLO", "realm", &Value::Null, rules, true).unwrap(),
            None
        );
        assert!(check_or_raise_uri("HELLO", "realm", &Value::Null, rules, false).is_err());
        assert!(
            check_or_raise_uri("HELLO", "realm", &Value::Integer(1), rules, true).is_err()
        );
    }

    #[test]
    fn principal_requires_all_keys() {
        let good = Value::Dict(dict(&[
            ("session", Value::Integer(9)),
            ("authid", Value::Str("alice".into())),
            ("authrole", Value::Str("user".into())),
        ]));
        let principal = check_or_raise_principal("PUBLISH", "forward_for", &good).unwrap();
        assert_eq!(principal.authid.as_deref(), Some("alice"));

        let missing_role = Value::Dict(dict(&[("session", Value::Integer(9))]));
        assert!(check_or_raise_principal("PUBLISH", "forward_for", &missing_role).is_err());

        let bad_session = Value::Dict(dict(&[
            ("session", Value::Str("9".into())),
            ("authrole", Value::Str("user".into())),
        ]));
        assert!(check_or_raise_principal("PUBLISH", "forward_for", &bad_session).is_err());
    }

    #[test]
    fn option_reader_type_checks() {
        let map = dict(&[
            ("acknowledge", Value::Bool(true)),
            ("timeout", Value::Integer(500)),
            ("concurrency", Value::Integer(0)),
            ("x_vendor", Value::Str("keep".into())),
            ("mystery", Value::Integer(1)),
        ]);
        let reader = OptionReader::new("TEST", &map);

        assert_eq!(reader.bool_opt("acknowledge").unwrap(), Some(true));
        assert_eq!(reader.non_negative_int_opt("timeout").unwrap(), Some(500));
        assert!(reader.positive_int_opt("concurrency").is_err());
        assert!(reader.bool_opt("timeout").is_err());

        let custom = reader.take_custom(&["acknowledge", "timeout", "concurrency"]);
        assert!(custom.contains_key("x_vendor"));
        assert!(!custom.contains_key("mystery"));
    }
}
