//! Request correlation ids.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Header a caller may use to supply its own request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ULID-backed request identifier carried through the gateway pipeline
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a well-formed incoming id, otherwise mint a fresh one
    #[must_use]
    pub fn from_header_or_new(value: Option<&str>) -> Self {
        match value.map(str::parse::<RequestId>) {
            Some(Ok(id)) => id,
            _ => Self::new(),
        }
    }

    #[must_use]
    pub fn as_ulid(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s.trim()).map(Self)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_id_is_reused() {
        let original = RequestId::new();
        let text = original.to_string();
        assert_eq!(RequestId::from_header_or_new(Some(&text)), original);
    }

    #[test]
    fn test_malformed_id_is_replaced() {
        let id = RequestId::from_header_or_new(Some("not-a-ulid"));
        assert_eq!(id.to_string().len(), 26);
        let id = RequestId::from_header_or_new(None);
        assert_eq!(id.to_string().len(), 26);
    }
}
