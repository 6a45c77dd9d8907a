//! Request identifiers.
//!
//! Every request is tagged with a [`RequestId`] held in the root frame of its
//! [`crate::context::Context`]. Routing frames pushed on the way down never
//! replace it, so any handler in the tree (and any log line it emits) sees
//! the id the request entered with.
//!
//! Ids come from two places:
//!
//! - [`crate::context::Context::new`] generates a fresh one.
//! - Callers that already have an id (the CLI `--request-id` option, an
//!   upstream correlation header) pass it through
//!   [`RequestId::parse_or_new`] and [`crate::context::Context::with_request_id`].
//!
//! The text form is the 26 character Crockford base32 ULID, which is also the
//! serde representation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Strongly typed request identifier backed by ULID.
///
/// Stamped into the root frame of every [`crate::context::Context`] so that
/// log lines emitted while a request walks the handler tree can be correlated.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    #[must_use]
    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(id)
    }

    /// Attempt to parse a caller supplied id.
    ///
    /// An absent or malformed value yields a freshly generated id.
    #[must_use]
    pub fn parse_or_new(value: Option<&str>) -> Self {
        value
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(RequestId(id))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_new_keeps_valid_id() {
        let id = RequestId::new();
        let text = id.to_string();
        assert_eq!(RequestId::parse_or_new(Some(&text)), id);
    }

    #[test]
    fn test_parse_or_new_replaces_garbage() {
        let id = RequestId::parse_or_new(Some("not-a-ulid"));
        assert_eq!(id.to_string().len(), 26);
    }

    #[test]
    fn test_parse_or_new_generates_when_absent() {
        let first = RequestId::parse_or_new(None);
        let second = RequestId::parse_or_new(None);
        assert_ne!(first, second);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let id = RequestId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
        let back: RequestId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
