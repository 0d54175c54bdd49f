//! The self-describing wire envelope.

use common::TransactionId;
use serde::{Deserialize, Serialize};

/// The single envelope shape every message on the bus uses.
///
/// `data` is a loose JSON object at the wire boundary by necessity (it is
/// shared with participant services written independently of this crate),
/// but every producer and consumer inside the orchestrator goes through
/// [`crate::Command`] or [`crate::Reply`] rather than touching `data`
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "serde_json::Value::default")]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Builds an envelope with an empty `data` object and no status/message
    /// — the shape outbound commands use.
    pub fn command(event: impl Into<String>, transaction_id: TransactionId, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            transaction_id: Some(transaction_id),
            status: None,
            message: None,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_roundtrip() {
        let env = Envelope::command(
            "reduce_stock",
            TransactionId::new(),
            serde_json::json!({"products": []}),
        );
        let json = serde_json::to_string(&env).unwrap();
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event, "reduce_stock");
        assert_eq!(back.transaction_id, env.transaction_id);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{"event": "reduce_stock", "data": {}}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert!(env.transaction_id.is_none());
        assert!(env.status.is_none());
        assert!(env.message.is_none());
    }
}
