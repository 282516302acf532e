//! WAMP URI addressing and pattern-based validation.
//!
//! Topics, procedures, errors and realms are dotted names
//! (`com.example.add`). Which shapes are acceptable depends on two
//! orthogonal knobs:
//!
//! - **strict vs loose**: strict components are `[a-z][0-9a-z_]*` (a
//!   lowercase letter followed by lowercase alphanumerics/underscore);
//!   loose components are anything except whitespace, `.` and `#`
//! - **empty components**: exact matching forbids them everywhere,
//!   wildcard matching (`a..c`) allows them anywhere, prefix matching
//!   (`a.b.`) allows only a trailing empty component
//!
//! The six resulting patterns are compiled once and selected by
//! [`UriRules`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static LOOSE_NON_EMPTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\s\.#]+\.)*([^\s\.#]+)$").expect("static pattern"));
static LOOSE_LAST_EMPTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\s\.#]+\.)*([^\s\.#]*)$").expect("static pattern"));
static LOOSE_EMPTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(([^\s\.#]+)|())(\.(([^\s\.#]+)|()))*$").expect("static pattern"));
static STRICT_NON_EMPTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z][0-9a-z_]*\.)*([a-z][0-9a-z_]*)$").expect("static pattern"));
static STRICT_LAST_EMPTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z][0-9a-z_]*\.)*(([a-z][0-9a-z_]*)?)$").expect("static pattern")
});
static STRICT_EMPTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([a-z][0-9a-z_]*)|())(\.(([a-z][0-9a-z_]*)|()))*$").expect("static pattern")
});

/// Where empty URI components are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyComponentRule {
    /// No empty components anywhere (exact matching).
    #[default]
    Nowhere,
    /// Empty components allowed in any position (wildcard matching).
    Everywhere,
    /// Only the final component may be empty (prefix matching).
    LastOnly,
}

/// Pattern selection for one validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UriRules {
    pub strict: bool,
    pub empty: EmptyComponentRule,
}

impl UriRules {
    pub const fn strict(empty: EmptyComponentRule) -> Self {
        UriRules {
            strict: true,
            empty,
        }
    }

    pub const fn loose(empty: EmptyComponentRule) -> Self {
        UriRules {
            strict: false,
            empty,
        }
    }

    fn pattern(&self) -> &'static Regex {
        match (self.strict, self.empty) {
            (false, EmptyComponentRule::Nowhere) => &LOOSE_NON_EMPTY,
            (false, EmptyComponentRule::Everywhere) => &LOOSE_EMPTY,
            (false, EmptyComponentRule::LastOnly) => &LOOSE_LAST_EMPTY,
            (true, EmptyComponentRule::Nowhere) => &STRICT_NON_EMPTY,
            (true, EmptyComponentRule::Everywhere) => &STRICT_EMPTY,
            (true, EmptyComponentRule::LastOnly) => &STRICT_LAST_EMPTY,
        }
    }

    /// Name of the selected pattern, reported in validation errors.
    pub fn pattern_name(&self) -> &'static str {
        match (self.strict, self.empty) {
            (false, EmptyComponentRule::Nowhere) => "loose-non-empty",
            (false, EmptyComponentRule::Everywhere) => "loose-empty",
            (false, EmptyComponentRule::LastOnly) => "loose-last-empty",
            (true, EmptyComponentRule::Nowhere) => "strict-non-empty",
            (true, EmptyComponentRule::Everywhere) => "strict-empty",
            (true, EmptyComponentRule::LastOnly) => "strict-last-empty",
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.pattern().is_match(candidate)
    }
}

/// A URI-shaped value failed pattern validation.
///
/// A refinement of the codec's protocol error: callers that care only
/// about session fatality treat it like any protocol violation, while
/// diagnostics report the pattern that failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid URI {value:?}: does not match pattern {pattern}")]
pub struct InvalidUriError {
    pub value: String,
    pub pattern: &'static str,
}

/// A validated WAMP URI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uri(String);

impl Uri {
    /// Validate `candidate` against `rules` and wrap it.
    pub fn try_new(candidate: impl Into<String>, rules: UriRules) -> Result<Self, InvalidUriError> {
        let candidate = candidate.into();
        if !rules.matches(&candidate) {
            return Err(InvalidUriError {
                value: candidate,
                pattern: rules.pattern_name(),
            });
        }
        Ok(Uri(candidate))
    }

    /// Wrap a string that is known valid (trusted constants, tests).
    ///
    /// Panics when the value fails even the most permissive pattern, so a
    /// typo in a constant is caught immediately.
    pub fn unchecked(value: impl Into<String>) -> Self {
        let value = value.into();
        assert!(
            UriRules::loose(EmptyComponentRule::Everywhere).matches(&value),
            "Uri::unchecked called with malformed URI {value:?}"
        );
        Uri(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mode_rejects_empty_and_whitespace() {
        let rules = UriRules::loose(EmptyComponentRule::Nowhere);
        assert!(rules.matches("com.example.add"));
        assert!(!rules.matches(""));
        assert!(!rules.matches("com..add"));
        assert!(!rules.matches("com.ex ample"));
        assert!(!rules.matches("com.ex#ample"));
    }

    #[test]
    fn strict_mode_rejects_uppercase_and_leading_digits() {
        let strict = UriRules::strict(EmptyComponentRule::Nowhere);
        assert!(strict.matches("com.example.add_2"));
        assert!(!strict.matches("com.Example.add"));
        assert!(!strict.matches("123"));
        assert!(!strict.matches("com.2fast.add"));
    }

    #[test]
    fn prefix_mode_allows_only_trailing_empty() {
        let prefix = UriRules::loose(EmptyComponentRule::LastOnly);
        assert!(prefix.matches("com.example."));
        assert!(prefix.matches("com.example"));
        assert!(!prefix.matches("com..example"));
    }

    #[test]
    fn wildcard_mode_allows_internal_empty() {
        let wildcard = UriRules::loose(EmptyComponentRule::Everywhere);
        assert!(wildcard.matches("com..add"));
        assert!(wildcard.matches(".example."));
    }

    #[test]
    fn error_carries_failing_pattern() {
        let err = Uri::try_new("com..add", UriRules::strict(EmptyComponentRule::Nowhere))
            .unwrap_err();
        assert_eq!(err.pattern, "strict-non-empty");
        assert_eq!(err.value, "com..add");
    }

    #[test]
    #[should_panic(expected = "malformed URI")]
    fn unchecked_panics_on_garbage() {
        Uri::unchecked("has whitespace");
    }
}
