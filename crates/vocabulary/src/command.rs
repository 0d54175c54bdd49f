//! Outbound commands the orchestrator issues to participant services.

use common::{Email, LineItem, Money, PaymentMethod, TransactionId};
use serde::Serialize;

use crate::envelope::Envelope;
use crate::queues;

/// A command the orchestrator has decided to publish, in the order listed
/// in spec §4.C. Each variant knows its own target queue and event name —
/// a closed union in place of the original system's free-form dict, so
/// adding a command the publish path doesn't handle is a compile error.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ReduceStock {
        transaction_id: TransactionId,
        items: Vec<LineItem>,
    },
    TakePayment {
        transaction_id: TransactionId,
        user_email: Email,
        amount: Money,
        payment_method: PaymentMethod,
    },
    CreateOrder {
        transaction_id: TransactionId,
        user_email: Email,
        vendor_email: Email,
        delivery_address: String,
        description: Option<String>,
        items: Vec<LineItem>,
    },
    RollbackStock {
        transaction_id: TransactionId,
    },
    RollbackPayment {
        transaction_id: TransactionId,
        payment_id: String,
    },
    RollbackOrder {
        transaction_id: TransactionId,
    },
    UpdateOrderPaymentId {
        transaction_id: TransactionId,
        order_id: String,
        payment_id: String,
    },
    UpdatePaymentOrderId {
        transaction_id: TransactionId,
        payment_id: String,
        order_id: String,
    },
}

#[derive(Serialize)]
struct ReduceStockItem<'a> {
    product_id: &'a str,
    quantity: u32,
}

#[derive(Serialize)]
struct CreateOrderItem<'a> {
    product_id: &'a str,
    quantity: u32,
    unit_price: f64,
}

impl Command {
    /// The event name carried in the envelope.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ReduceStock { .. } => "reduce_stock",
            Self::TakePayment { .. } => "take_payment",
            Self::CreateOrder { .. } => "create_order",
            Self::RollbackStock { .. } => "rollback_stock",
            Self::RollbackPayment { .. } => "rollback_payment",
            Self::RollbackOrder { .. } => "rollback_order",
            Self::UpdateOrderPaymentId { .. } => "update_order_payment_id",
            Self::UpdatePaymentOrderId { .. } => "update_payment_order_id",
        }
    }

    /// The queue this command is published to.
    pub fn target_queue(&self) -> &'static str {
        match self {
            Self::ReduceStock { .. } | Self::RollbackStock { .. } => queues::PRODUCTS_QUEUE,
            Self::TakePayment { .. }
            | Self::RollbackPayment { .. }
            | Self::UpdatePaymentOrderId { .. } => queues::PAYMENT_QUEUE,
            Self::CreateOrder { .. }
            | Self::RollbackOrder { .. }
            | Self::UpdateOrderPaymentId { .. } => queues::ORDERS_QUEUE,
        }
    }

    /// The transaction id this command belongs to.
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::ReduceStock { transaction_id, .. }
            | Self::TakePayment { transaction_id, .. }
            | Self::CreateOrder { transaction_id, .. }
            | Self::RollbackStock { transaction_id }
            | Self::RollbackPayment { transaction_id, .. }
            | Self::RollbackOrder { transaction_id }
            | Self::UpdateOrderPaymentId { transaction_id, .. }
            | Self::UpdatePaymentOrderId { transaction_id, .. } => *transaction_id,
        }
    }

    /// Renders this command as the wire envelope to publish.
    pub fn to_envelope(&self) -> Envelope {
        let data = match self {
            Self::ReduceStock { items, .. } => serde_json::json!({
                "products": items
                    .iter()
                    .map(|i| ReduceStockItem { product_id: i.product_id.as_str(), quantity: i.quantity })
                    .collect::<Vec<_>>(),
            }),
            Self::TakePayment {
                user_email,
                amount,
                payment_method,
                ..
            } => serde_json::json!({
                "user_email": user_email.as_str(),
                "amount": amount.as_decimal(),
                "payment_method": payment_method.as_str(),
                "payment_status": "Pending",
            }),
            Self::CreateOrder {
                user_email,
                vendor_email,
                delivery_address,
                description,
                items,
                ..
            } => serde_json::json!({
                "user_email": user_email.as_str(),
                "vendor_email": vendor_email.as_str(),
                "delivery_address": delivery_address,
                "description": description,
                "status": "Pending",
                "items": items
                    .iter()
                    .map(|i| CreateOrderItem {
                        product_id: i.product_id.as_str(),
                        quantity: i.quantity,
                        unit_price: i.unit_price.as_decimal(),
                    })
                    .collect::<Vec<_>>(),
            }),
            Self::RollbackStock { .. } | Self::RollbackOrder { .. } => serde_json::json!({}),
            Self::RollbackPayment { payment_id, .. } => serde_json::json!({
                "payment_id": payment_id,
            }),
            Self::UpdateOrderPaymentId {
                order_id,
                payment_id,
                ..
            } => serde_json::json!({
                "order_id": order_id,
                "payment_id": payment_id,
            }),
            Self::UpdatePaymentOrderId {
                payment_id,
                order_id,
                ..
            } => serde_json::json!({
                "payment_id": payment_id,
                "order_id": order_id,
            }),
        };

        Envelope::command(self.event_name(), self.transaction_id(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn tid() -> TransactionId {
        TransactionId::new()
    }

    #[test]
    fn reduce_stock_targets_products_queue() {
        let cmd = Command::ReduceStock {
            transaction_id: tid(),
            items: vec![LineItem::new(ProductId::new("p1"), 2, Money::from_cents(1000))],
        };
        assert_eq!(cmd.event_name(), "reduce_stock");
        assert_eq!(cmd.target_queue(), queues::PRODUCTS_QUEUE);
        let env = cmd.to_envelope();
        assert_eq!(env.data["products"][0]["product_id"], "p1");
        assert_eq!(env.data["products"][0]["quantity"], 2);
    }

    #[test]
    fn take_payment_carries_amount_and_method() {
        let cmd = Command::TakePayment {
            transaction_id: tid(),
            user_email: Email::parse("a@b.com").unwrap(),
            amount: Money::from_cents(2550),
            payment_method: PaymentMethod::CreditCard,
        };
        assert_eq!(cmd.target_queue(), queues::PAYMENT_QUEUE);
        let env = cmd.to_envelope();
        assert_eq!(env.data["amount"], 25.5);
        assert_eq!(env.data["payment_method"], "Credit Card");
        assert_eq!(env.data["payment_status"], "Pending");
    }

    #[test]
    fn rollback_payment_carries_payment_id() {
        let cmd = Command::RollbackPayment {
            transaction_id: tid(),
            payment_id: "PAY-1".to_string(),
        };
        let env = cmd.to_envelope();
        assert_eq!(env.data["payment_id"], "PAY-1");
        assert_eq!(cmd.target_queue(), queues::PAYMENT_QUEUE);
    }

    #[test]
    fn update_commands_target_their_own_queues_in_the_expected_order() {
        let update_order = Command::UpdateOrderPaymentId {
            transaction_id: tid(),
            order_id: "O1".to_string(),
            payment_id: "P1".to_string(),
        };
        let update_payment = Command::UpdatePaymentOrderId {
            transaction_id: tid(),
            payment_id: "P1".to_string(),
            order_id: "O1".to_string(),
        };
        assert_eq!(update_order.target_queue(), queues::ORDERS_QUEUE);
        assert_eq!(update_payment.target_queue(), queues::PAYMENT_QUEUE);
    }
}
