//! Bearer token extraction from the `Authorization` header.

use std::fmt;

const BEARER_PREFIX: &str = "bearer ";

/// Token presented by the caller. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Parse an `Authorization` header value of the form `Bearer <token>`.
    ///
    /// The scheme is matched case-insensitively. Returns `None` for any other
    /// scheme, an empty token, or a token with characters outside visible
    /// ASCII (a lossily decoded header shows up as U+FFFD).
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        let scheme = value.get(..BEARER_PREFIX.len())?;
        if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
            return None;
        }

        let token = value[BEARER_PREFIX.len()..].trim();
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_graphic()) {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header value to send onward.
    pub fn to_header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(****)")
    }
}
