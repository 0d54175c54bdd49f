//! Per-saga records persisted by the [`crate::SagaStore`].
//!
//! These are plain, `serde`-serializable snapshots stored as opaque JSON
//! blobs under the keyspace in spec §6 — not an event-sourced aggregate.
//! The saga store is a TTL-bounded cache, and the coordinator is the sole
//! writer.

use common::{Email, LineItem, Money, PaymentMethod, TransactionId};
use serde::{Deserialize, Serialize};

/// The state an order-saga record can be in, per the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagaStatus {
    Pending,
    StockReduced,
    PaymentTaken,
    OrderCreated,
    Completed,
    Compensating,
    Canceled,
    Failed,
}

impl SagaStatus {
    /// Terminal states are ignored by subsequent replies (invariant 6).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed)
    }
}

/// The order-saga record: the primary per-`tid` view of a saga's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSagaRecord {
    pub tid: TransactionId,
    pub user_email: Email,
    pub vendor_email: Email,
    pub delivery_address: String,
    pub description: Option<String>,
    pub status: SagaStatus,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
}

impl OrderSagaRecord {
    /// Σ quantity · unit_price over the saga's items, computed once at
    /// ingress time (spec §4.D: "late edits are not supported").
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(LineItem::total).sum()
    }
}

/// The product-saga record: exactly what was asked of the inventory
/// service, so compensation is unambiguous. Carries *all* items (open
/// question 2 of spec §9), not just the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSagaRecord {
    pub tid: TransactionId,
    pub items: Vec<LineItem>,
}

/// Mirrors spec §3's `payment_status` enum. Distinct from [`SagaStatus`]
/// because it describes the payment participant's own lifecycle, not the
/// saga's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

/// The payment-saga record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSagaRecord {
    pub tid: TransactionId,
    pub user_email: Email,
    pub order_id: Option<String>,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    #[test]
    fn terminal_states_are_recognized() {
        assert!(SagaStatus::Completed.is_terminal());
        assert!(SagaStatus::Canceled.is_terminal());
        assert!(SagaStatus::Failed.is_terminal());
        assert!(!SagaStatus::Pending.is_terminal());
        assert!(!SagaStatus::StockReduced.is_terminal());
    }

    #[test]
    fn total_amount_sums_line_items() {
        let record = OrderSagaRecord {
            tid: TransactionId::new(),
            user_email: Email::parse("a@b.com").unwrap(),
            vendor_email: Email::parse("v@b.com").unwrap(),
            delivery_address: "123 Main St".to_string(),
            description: None,
            status: SagaStatus::Pending,
            items: vec![
                LineItem::new(ProductId::new("p1"), 2, Money::from_cents(1000)),
                LineItem::new(ProductId::new("p2"), 1, Money::from_cents(550)),
            ],
            payment_method: PaymentMethod::CreditCard,
            payment_id: None,
            order_id: None,
        };
        assert_eq!(record.total_amount(), Money::from_cents(2550));
    }
}
