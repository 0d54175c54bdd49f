//! Transaction identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one saga attempt (`tid` in the spec).
///
/// Wraps a UUID v4 and renders as the 36-character lowercase hyphenated
/// form. Unique per `start_order` call; the primary key across all three
/// per-saga records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Mints a new random transaction id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID as a transaction id.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a transaction id from its hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TransactionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TransactionId> for Uuid {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(TransactionId::new(), TransactionId::new());
    }

    #[test]
    fn display_is_36_char_hyphenated() {
        let tid = TransactionId::new();
        let rendered = tid.to_string();
        assert_eq!(rendered.len(), 36);
        assert_eq!(rendered, rendered.to_lowercase());
    }

    #[test]
    fn parse_roundtrips_through_display() {
        let tid = TransactionId::new();
        let parsed = TransactionId::parse(&tid.to_string()).unwrap();
        assert_eq!(tid, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TransactionId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn serialization_roundtrip() {
        let tid = TransactionId::new();
        let json = serde_json::to_string(&tid).unwrap();
        let deserialized: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(tid, deserialized);
    }
}
