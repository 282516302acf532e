//! # Wampcore Unified Types Library
//!
//! Pure data definitions shared by every layer of the WAMP stack: the
//! generic transit [`Value`] model, interop-safe [`WampId`] identifiers,
//! [`Uri`] addressing with pattern-based validation, forwarding
//! [`Principal`] records, and the closed option-value registries
//! (`match`, `invoke`, cancel `mode`, payload encryption identifiers).
//!
//! ## Design Philosophy
//!
//! - **Pure Data Structures**: No encoding or parsing logic lives here —
//!   the codec crate owns all wire rules
//! - **Type Safety**: Distinct newtypes prevent mixing ids, URIs and raw
//!   strings; option values are closed enums, not stringly-typed
//! - **Interop Ranges Enforced**: WAMP ids are confined to `[0, 2^53]` so
//!   every serializer (including JSON) round-trips them losslessly
//! - **Clear Boundaries**: Validation errors raised here
//!   ([`InvalidUriError`], [`IdRangeError`]) are refined by the codec's
//!   protocol-level taxonomy
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → libs/codec → transport
//!     ↑             ↓           ↓
//! Pure Data     Wire Rules    Framed Bytes
//! Value/Uri     parse/marshal WebSocket/RawSocket
//! WampId        build/cast    (out of scope)
//! ```

pub mod ids;
pub mod options;
pub mod principal;
pub mod roles;
pub mod uri;
pub mod value;

pub use ids::{IdRangeError, WampId};
pub use options::{
    is_custom_identifier, CancelMode, InvocationPolicy, MatchPolicy, PayloadEncAlgo,
    PayloadSerializerId,
};
pub use principal::Principal;
pub use roles::{ClientRole, ClientRoleMap, RoleFeatures, RouterRole, RouterRoleMap};
pub use uri::{EmptyComponentRule, InvalidUriError, Uri, UriRules};
pub use value::{Dict, Value};
