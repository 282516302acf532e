//! Closed registries for spec-defined option values.
//!
//! Each enum mirrors one option key whose legal values are fixed by the
//! protocol (`match`, `invoke`, cancel `mode`) or fixed-plus-extensible
//! via the `x_*` custom pattern (payload encryption identifiers). Parsing
//! returns `None` for out-of-set values so the codec can attach
//! message/field context to the resulting error.

use std::fmt;

use crate::uri::{EmptyComponentRule, UriRules};

/// Custom-extension identifiers must look like `x_something`.
pub fn is_custom_identifier(value: &str) -> bool {
    match value.strip_prefix("x_") {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_'),
        None => false,
    }
}

/// Subscription/registration matching policy (`match` option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    #[default]
    Exact,
    Prefix,
    Wildcard,
}

impl MatchPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchPolicy::Exact => "exact",
            MatchPolicy::Prefix => "prefix",
            MatchPolicy::Wildcard => "wildcard",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "exact" => Some(MatchPolicy::Exact),
            "prefix" => Some(MatchPolicy::Prefix),
            "wildcard" => Some(MatchPolicy::Wildcard),
            _ => None,
        }
    }

    /// URI emptiness rule implied by this policy: prefix subscriptions may
    /// end in an empty component, wildcard subscriptions may have empty
    /// components anywhere.
    pub fn uri_rules(self, strict: bool) -> UriRules {
        let empty = match self {
            MatchPolicy::Exact => EmptyComponentRule::Nowhere,
            MatchPolicy::Prefix => EmptyComponentRule::LastOnly,
            MatchPolicy::Wildcard => EmptyComponentRule::Everywhere,
        };
        UriRules { strict, empty }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared-registration invocation policy (`invoke` option on `Register`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationPolicy {
    #[default]
    Single,
    RoundRobin,
    Random,
    First,
    Last,
}

impl InvocationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            InvocationPolicy::Single => "single",
            InvocationPolicy::RoundRobin => "roundrobin",
            InvocationPolicy::Random => "random",
            InvocationPolicy::First => "first",
            InvocationPolicy::Last => "last",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "single" => Some(InvocationPolicy::Single),
            "roundrobin" => Some(InvocationPolicy::RoundRobin),
            "random" => Some(InvocationPolicy::Random),
            "first" => Some(InvocationPolicy::First),
            "last" => Some(InvocationPolicy::Last),
            _ => None,
        }
    }
}

/// Call cancellation mode (`mode` option on `Cancel`/`Interrupt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    Skip,
    Kill,
    KillNoWait,
}

impl CancelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CancelMode::Skip => "skip",
            CancelMode::Kill => "kill",
            CancelMode::KillNoWait => "killnowait",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "skip" => Some(CancelMode::Skip),
            "kill" => Some(CancelMode::Kill),
            "killnowait" => Some(CancelMode::KillNoWait),
            _ => None,
        }
    }
}

/// End-to-end payload encryption algorithm (`enc_algo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadEncAlgo {
    Cryptobox,
    Mqtt,
    Xbr,
    /// Custom extension algorithm, always `x_*`-shaped.
    Custom(String),
}

impl PayloadEncAlgo {
    pub fn as_str(&self) -> &str {
        match self {
            PayloadEncAlgo::Cryptobox => "cryptobox",
            PayloadEncAlgo::Mqtt => "mqtt",
            PayloadEncAlgo::Xbr => "xbr",
            PayloadEncAlgo::Custom(name) => name,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "cryptobox" => Some(PayloadEncAlgo::Cryptobox),
            "mqtt" => Some(PayloadEncAlgo::Mqtt),
            "xbr" => Some(PayloadEncAlgo::Xbr),
            custom if is_custom_identifier(custom) => {
                Some(PayloadEncAlgo::Custom(custom.to_string()))
            }
            _ => None,
        }
    }
}

/// Serializer used for an opaque payload's inner encoding
/// (`enc_serializer`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSerializerId {
    Json,
    Msgpack,
    Cbor,
    /// Custom extension serializer, always `x_*`-shaped.
    Custom(String),
}

impl PayloadSerializerId {
    pub fn as_str(&self) -> &str {
        match self {
            PayloadSerializerId::Json => "json",
            PayloadSerializerId::Msgpack => "msgpack",
            PayloadSerializerId::Cbor => "cbor",
            PayloadSerializerId::Custom(name) => name,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "json" => Some(PayloadSerializerId::Json),
            "msgpack" => Some(PayloadSerializerId::Msgpack),
            "cbor" => Some(PayloadSerializerId::Cbor),
            custom if is_custom_identifier(custom) => {
                Some(PayloadSerializerId::Custom(custom.to_string()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_identifier_shape() {
        assert!(is_custom_identifier("x_aes256"));
        assert!(is_custom_identifier("x_v2_beta"));
        assert!(!is_custom_identifier("x_"));
        assert!(!is_custom_identifier("aes256"));
        assert!(!is_custom_identifier("x_has space"));
    }

    #[test]
    fn match_policy_selects_uri_rule() {
        assert_eq!(
            MatchPolicy::Prefix.uri_rules(false).empty,
            EmptyComponentRule::LastOnly
        );
        assert_eq!(
            MatchPolicy::Wildcard.uri_rules(true).empty,
            EmptyComponentRule::Everywhere
        );
        assert!(MatchPolicy::Exact.uri_rules(false).matches("com.example"));
        assert!(!MatchPolicy::Exact.uri_rules(false).matches("com.example."));
        assert!(MatchPolicy::Prefix.uri_rules(false).matches("com.example."));
    }

    #[test]
    fn enc_algo_registry() {
        assert_eq!(
            PayloadEncAlgo::from_str("cryptobox"),
            Some(PayloadEncAlgo::Cryptobox)
        );
        assert_eq!(
            PayloadEncAlgo::from_str("x_custom"),
            Some(PayloadEncAlgo::Custom("x_custom".into()))
        );
        assert_eq!(PayloadEncAlgo::from_str("rot13"), None);
    }

    #[test]
    fn cancel_mode_registry() {
        assert_eq!(CancelMode::from_str("killnowait"), Some(CancelMode::KillNoWait));
        assert_eq!(CancelMode::from_str("abort"), None);
    }
}
