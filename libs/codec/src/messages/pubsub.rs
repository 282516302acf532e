//! Pub/Sub control messages: Subscribe, Subscribed, Unsubscribe,
//! Unsubscribed, Published.
//!
//! `Subscribe.match` selects the URI pattern the topic must satisfy;
//! `Unsubscribed` doubles as the router-initiated revocation form when
//! `request == 0`.

use wamp_types::{Dict, MatchPolicy, Principal, Uri, UriRules, Value, WampId};

use crate::error::{ProtocolError, ProtocolResult};
use crate::validation::{
    check_or_raise_extra, check_or_raise_id, check_or_raise_nonzero_id,
    check_or_raise_required_uri, OptionReader,
};

use super::common::{expect_length, marshal_forward_for};
use super::MessageType;

/// `[SUBSCRIBE, request|id, options|dict, topic|uri]`
#[derive(Debug, Clone, PartialEq)]
pub struct Subscribe {
    pub request: WampId,
    pub topic: Uri,
    pub match_policy: MatchPolicy,
    pub get_retained: Option<bool>,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Subscribe {
    pub const NAME: &'static str = "SUBSCRIBE";

    pub fn new(request: WampId, topic: Uri) -> Self {
        assert!(!request.is_zero(), "SUBSCRIBE.request must be a live id");
        Subscribe {
            request,
            topic,
            match_policy: MatchPolicy::Exact,
            get_retained: None,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[4], "4")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let options = check_or_raise_extra(Self::NAME, "options", &wmsg[2])?;
        let reader = OptionReader::new(Self::NAME, &options);

        let match_policy = reader
            .enum_opt("match", MatchPolicy::from_str)?
            .unwrap_or_default();
        // topic emptiness depends on the matching policy
        let topic = check_or_raise_required_uri(
            Self::NAME,
            "topic",
            &wmsg[3],
            match_policy.uri_rules(false),
        )?;

        Ok(Subscribe {
            request,
            topic,
            match_policy,
            get_retained: reader.bool_opt("get_retained")?,
            forward_for: reader.forward_for_opt()?.unwrap_or_default(),
            custom: reader.take_custom(&["match", "get_retained", "forward_for"]),
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut options = self.custom.clone();
        if self.match_policy != MatchPolicy::Exact {
            options.insert("match".into(), Value::from(self.match_policy.as_str()));
        }
        if let Some(get_retained) = self.get_retained {
            options.insert("get_retained".into(), Value::Bool(get_retained));
        }
        marshal_forward_for(&self.forward_for, &mut options);

        vec![
            Value::Integer(MessageType::Subscribe as i64),
            Value::from(self.request.into_raw()),
            Value::Dict(options),
            Value::from(self.topic.as_str()),
        ]
    }
}

/// `[SUBSCRIBED, request|id, subscription|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Subscribed {
    pub request: WampId,
    pub subscription: WampId,
}

impl Subscribed {
    pub const NAME: &'static str = "SUBSCRIBED";

    pub fn new(request: WampId, subscription: WampId) -> Self {
        Subscribed {
            request,
            subscription,
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        Ok(Subscribed {
            request: check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?,
            subscription: check_or_raise_id(Self::NAME, "subscription", &wmsg[2])?,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        vec![
            Value::Integer(MessageType::Subscribed as i64),
            Value::from(self.request.into_raw()),
            Value::from(self.subscription.into_raw()),
        ]
    }
}

/// `[UNSUBSCRIBE, request|id, subscription|id, options|dict?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Unsubscribe {
    pub request: WampId,
    pub subscription: WampId,
    pub forward_for: Vec<Principal>,
    pub custom: Dict,
}

impl Unsubscribe {
    pub const NAME: &'static str = "UNSUBSCRIBE";

    pub fn new(request: WampId, subscription: WampId) -> Self {
        Unsubscribe {
            request,
            subscription,
            forward_for: Vec::new(),
            custom: Dict::new(),
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3, 4], "3 or 4")?;
        let request = check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?;
        let subscription = check_or_raise_id(Self::NAME, "subscription", &wmsg[2])?;

        let (forward_for, custom) = if wmsg.len() == 4 {
            let options = check_or_raise_extra(Self::NAME, "options", &wmsg[3])?;
            let reader = OptionReader::new(Self::NAME, &options);
            (
                reader.forward_for_opt()?.unwrap_or_default(),
                reader.take_custom(&["forward_for"]),
            )
        } else {
            (Vec::new(), Dict::new())
        };

        Ok(Unsubscribe {
            request,
            subscription,
            forward_for,
            custom,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        let mut wire = vec![
            Value::Integer(MessageType::Unsubscribe as i64),
            Value::from(self.request.into_raw()),
            Value::from(self.subscription.into_raw()),
        ];
        if !self.forward_for.is_empty() || !self.custom.is_empty() {
            let mut options = self.custom.clone();
            marshal_forward_for(&self.forward_for, &mut options);
            wire.push(Value::Dict(options));
        }
        wire
    }
}

/// `[UNSUBSCRIBED, request|id, details|dict?]`
///
/// The router-initiated (revocation) form carries `request == 0` plus
/// `details.subscription`; the reply form carries the original request id
/// and no details.
#[derive(Debug, Clone, PartialEq)]
pub struct Unsubscribed {
    pub request: WampId,
    pub subscription: Option<WampId>,
    pub reason: Option<Uri>,
    pub custom: Dict,
}

impl Unsubscribed {
    pub const NAME: &'static str = "UNSUBSCRIBED";

    /// Reply to a client-initiated `Unsubscribe`.
    pub fn reply(request: WampId) -> Self {
        assert!(!request.is_zero(), "reply form requires the original request id");
        Unsubscribed {
            request,
            subscription: None,
            reason: None,
            custom: Dict::new(),
        }
    }

    /// Router-initiated revocation of an active subscription.
    pub fn revocation(subscription: WampId, reason: Option<Uri>) -> Self {
        assert!(
            !subscription.is_zero(),
            "revocation requires a non-zero subscription id"
        );
        Unsubscribed {
            request: WampId::ZERO,
            subscription: Some(subscription),
            reason,
            custom: Dict::new(),
        }
    }

    fn assert_valid(&self) {
        if self.request.is_zero() {
            assert!(
                self.subscription.is_some(),
                "router-initiated UNSUBSCRIBED requires details.subscription"
            );
        } else {
            assert!(
                self.subscription.is_none() && self.reason.is_none(),
                "reply-form UNSUBSCRIBED must not carry revocation details"
            );
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[2, 3], "2 or 3")?;
        let request = check_or_raise_id(Self::NAME, "request", &wmsg[1])?;

        let (subscription, reason, custom) = if wmsg.len() == 3 {
            let details = check_or_raise_extra(Self::NAME, "details", &wmsg[2])?;
            let reader = OptionReader::new(Self::NAME, &details);
            let subscription = match reader.id_opt("subscription")? {
                Some(id) if id.is_zero() => {
                    return Err(ProtocolError::invalid_id(
                        Self::NAME,
                        "subscription",
                        "revoked subscription id must be non-zero",
                    ));
                }
                other => other,
            };
            (
                subscription,
                reader.uri_opt("reason", UriRules::default())?,
                reader.take_custom(&["subscription", "reason"]),
            )
        } else {
            (None, None, Dict::new())
        };

        // request == 0 is the revocation sentinel and only valid together
        // with a subscription id; a live request id must not carry one
        if request.is_zero() && subscription.is_none() {
            return Err(ProtocolError::missing_field(Self::NAME, "subscription"));
        }
        if !request.is_zero() && subscription.is_some() {
            return Err(ProtocolError::invalid_id(
                Self::NAME,
                "request",
                "revocation details require request == 0",
            ));
        }

        Ok(Unsubscribed {
            request,
            subscription,
            reason,
            custom,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        self.assert_valid();
        let mut wire = vec![
            Value::Integer(MessageType::Unsubscribed as i64),
            Value::from(self.request.into_raw()),
        ];
        if self.subscription.is_some() || self.reason.is_some() || !self.custom.is_empty() {
            let mut details = self.custom.clone();
            if let Some(subscription) = self.subscription {
                details.insert("subscription".into(), Value::from(subscription.into_raw()));
            }
            if let Some(reason) = &self.reason {
                details.insert("reason".into(), Value::from(reason.as_str()));
            }
            wire.push(Value::Dict(details));
        }
        wire
    }
}

/// `[PUBLISHED, request|id, publication|id]`
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub request: WampId,
    pub publication: WampId,
}

impl Published {
    pub const NAME: &'static str = "PUBLISHED";

    pub fn new(request: WampId, publication: WampId) -> Self {
        Published {
            request,
            publication,
        }
    }

    pub fn parse(wmsg: &[Value]) -> ProtocolResult<Self> {
        expect_length(Self::NAME, wmsg, &[3], "3")?;
        Ok(Published {
            request: check_or_raise_nonzero_id(Self::NAME, "request", &wmsg[1])?,
            publication: check_or_raise_id(Self::NAME, "publication", &wmsg[2])?,
        })
    }

    pub fn marshal(&self) -> Vec<Value> {
        vec![
            Value::Integer(MessageType::Published as i64),
            Value::from(self.request.into_raw()),
            Value::from(self.publication.into_raw()),
        ]
    }
}
