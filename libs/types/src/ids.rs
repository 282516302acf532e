//! WAMP identifier type confined to the interop-safe integer range.
//!
//! Every session, request, subscription, registration and publication id
//! is an integer in `[0, 2^53]` so that JSON peers (whose numbers are IEEE
//! doubles) round-trip them exactly. Zero is reserved as the sentinel for
//! router-initiated revocation messages and is rejected wherever a live
//! request id is required.

use std::fmt;

use thiserror::Error;

/// Raised when an integer falls outside the WAMP id range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("id {value} outside valid WAMP range [0, 2^53]")]
pub struct IdRangeError {
    pub value: i128,
}

/// A WAMP id in `[0, 2^53]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WampId(u64);

impl WampId {
    /// Largest representable id (`2^53`, inclusive).
    pub const MAX: u64 = 1 << 53;

    /// Sentinel meaning "router-initiated, no originating request".
    pub const ZERO: WampId = WampId(0);

    /// Validate and wrap a raw integer.
    pub fn try_new(value: u64) -> Result<Self, IdRangeError> {
        if value > Self::MAX {
            return Err(IdRangeError {
                value: value as i128,
            });
        }
        Ok(WampId(value))
    }

    /// Access the raw id value.
    pub fn into_raw(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u64> for WampId {
    type Error = IdRangeError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        WampId::try_new(value)
    }
}

impl TryFrom<i64> for WampId {
    type Error = IdRangeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(IdRangeError {
                value: value as i128,
            });
        }
        WampId::try_new(value as u64)
    }
}

impl From<WampId> for u64 {
    fn from(id: WampId) -> u64 {
        id.0
    }
}

impl fmt::Display for WampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundary_values() {
        assert_eq!(WampId::try_new(0), Ok(WampId::ZERO));
        assert!(WampId::try_new(WampId::MAX).is_ok());
        assert!(WampId::try_new(WampId::MAX + 1).is_err());
        assert!(WampId::try_from(-1i64).is_err());
    }

    #[test]
    fn zero_sentinel() {
        assert!(WampId::ZERO.is_zero());
        assert!(!WampId::try_new(1).unwrap().is_zero());
    }

    proptest! {
        #[test]
        fn in_range_ids_roundtrip(raw in 0u64..=WampId::MAX) {
            let id = WampId::try_new(raw).unwrap();
            prop_assert_eq!(id.into_raw(), raw);
        }

        #[test]
        fn out_of_range_ids_rejected(raw in (WampId::MAX + 1)..u64::MAX) {
            prop_assert!(WampId::try_new(raw).is_err());
        }
    }
}
