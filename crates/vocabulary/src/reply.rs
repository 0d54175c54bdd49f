//! Inbound replies consumed from `orchestration_queue`.

use common::TransactionId;
use serde::Deserialize;
use thiserror::Error;

use crate::envelope::Envelope;

/// Whether a reply's `status` signals success or failure of the step.
///
/// The rule is literal: any status string containing the substring
/// `"error"` (case-sensitive) is a failure; anything else — including the
/// canonical `"success"` — is success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn from_status(status: &str) -> Self {
        if status.contains("error") {
            Self::Failure(status.to_string())
        } else {
            Self::Success
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The event-specific payload of a parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPayload {
    ReduceStock,
    TakePayment { payment_id: Option<String> },
    CreateOrder { order_id: Option<String> },
}

/// A reply from a participant service, parsed out of the raw [`Envelope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub transaction_id: TransactionId,
    pub outcome: Outcome,
    pub payload: ReplyPayload,
}

/// Why an envelope could not be parsed into a [`Reply`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyParseError {
    /// `event` did not match one of the three known reply kinds. Acked and
    /// logged as a warning by the coordinator; not a hard error.
    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    /// The envelope had no `transaction_id`.
    #[error("reply is missing a transaction_id")]
    MissingTransactionId,

    /// The envelope had no `status`.
    #[error("reply is missing a status")]
    MissingStatus,
}

#[derive(Deserialize)]
struct TakePaymentData {
    #[serde(default)]
    payment_id: Option<String>,
}

#[derive(Deserialize)]
struct CreateOrderData {
    #[serde(default)]
    order_id: Option<String>,
}

impl Reply {
    /// Parses an envelope into a typed reply.
    ///
    /// Unknown event types are reported as an error so the coordinator can
    /// ack-and-drop with a warning (spec §7) instead of silently ignoring
    /// them.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ReplyParseError> {
        let transaction_id = envelope
            .transaction_id
            .ok_or(ReplyParseError::MissingTransactionId)?;
        let status = envelope.status.ok_or(ReplyParseError::MissingStatus)?;
        let outcome = Outcome::from_status(&status);

        let payload = match envelope.event.as_str() {
            "reduce_stock" => ReplyPayload::ReduceStock,
            "take_payment" => {
                let data: TakePaymentData =
                    serde_json::from_value(envelope.data).unwrap_or(TakePaymentData { payment_id: None });
                ReplyPayload::TakePayment {
                    payment_id: data.payment_id,
                }
            }
            "create_order" => {
                let data: CreateOrderData =
                    serde_json::from_value(envelope.data).unwrap_or(CreateOrderData { order_id: None });
                ReplyPayload::CreateOrder {
                    order_id: data.order_id,
                }
            }
            other => return Err(ReplyParseError::UnknownEvent(other.to_string())),
        };

        Ok(Self {
            transaction_id,
            outcome,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(event: &str, status: &str, data: serde_json::Value) -> Envelope {
        Envelope {
            event: event.to_string(),
            transaction_id: Some(TransactionId::new()),
            status: Some(status.to_string()),
            message: None,
            data,
        }
    }

    #[test]
    fn success_status_is_not_failure() {
        assert_eq!(Outcome::from_status("success"), Outcome::Success);
    }

    #[test]
    fn status_containing_error_is_failure() {
        assert_eq!(
            Outcome::from_status("error: out of stock"),
            Outcome::Failure("error: out of stock".to_string())
        );
    }

    #[test]
    fn status_is_case_sensitive_for_error() {
        // "Error" (capital E) does not contain the lowercase substring "error".
        assert_eq!(Outcome::from_status("Error: declined"), Outcome::Success);
    }

    #[test]
    fn reduce_stock_reply_has_no_payload_data() {
        let env = envelope("reduce_stock", "success", serde_json::json!({}));
        let reply = Reply::from_envelope(env).unwrap();
        assert_eq!(reply.payload, ReplyPayload::ReduceStock);
        assert!(reply.outcome.is_success());
    }

    #[test]
    fn take_payment_reply_carries_payment_id() {
        let env = envelope(
            "take_payment",
            "success",
            serde_json::json!({"payment_id": "PAY-1"}),
        );
        let reply = Reply::from_envelope(env).unwrap();
        assert_eq!(
            reply.payload,
            ReplyPayload::TakePayment {
                payment_id: Some("PAY-1".to_string())
            }
        );
    }

    #[test]
    fn create_order_reply_carries_order_id() {
        let env = envelope(
            "create_order",
            "success",
            serde_json::json!({"order_id": "ORD-1"}),
        );
        let reply = Reply::from_envelope(env).unwrap();
        assert_eq!(
            reply.payload,
            ReplyPayload::CreateOrder {
                order_id: Some("ORD-1".to_string())
            }
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        let env = envelope("frobnicate", "success", serde_json::json!({}));
        assert_eq!(
            Reply::from_envelope(env),
            Err(ReplyParseError::UnknownEvent("frobnicate".to_string()))
        );
    }

    #[test]
    fn missing_transaction_id_is_rejected() {
        let mut env = envelope("reduce_stock", "success", serde_json::json!({}));
        env.transaction_id = None;
        assert_eq!(
            Reply::from_envelope(env),
            Err(ReplyParseError::MissingTransactionId)
        );
    }
}
