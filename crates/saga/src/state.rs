//! Pure transition function over (current saga record, incoming reply) →
//! (next saga record, outbound commands). No I/O: the coordinator is
//! responsible for persisting the returned records and publishing the
//! returned commands, in that order.
//!
//! `Compensating` is a real state in the data model but is never observed
//! between steps here: issuing the rollback commands for a failed or
//! canceled step and landing in `Failed`/`Canceled` happen atomically
//! within one call to [`transition`] or [`cancel`].

use common::TransactionId;
use store::{OrderSagaRecord, PaymentSagaRecord, PaymentStatus, SagaStatus};
use vocabulary::{Command, Outcome, Reply, ReplyPayload};

/// The result of applying one reply or cancel request to a saga.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub order: OrderSagaRecord,
    pub payment: PaymentSagaRecord,
    pub commands: Vec<Command>,
    /// Set when the order-id index must be written for this `tid`.
    pub order_id_index: Option<String>,
}

impl StepOutcome {
    fn unchanged(order: &OrderSagaRecord, payment: &PaymentSagaRecord) -> Self {
        Self {
            order: order.clone(),
            payment: payment.clone(),
            commands: Vec::new(),
            order_id_index: None,
        }
    }
}

/// A saga past this point never reacts to another reply; it is acked and
/// dropped. `OrderCreated` is included because, in this implementation, a
/// successful `create_order` reply advances straight to `Completed` within
/// one call to [`transition`] rather than resting at `OrderCreated`.
fn ignores_replies(status: SagaStatus) -> bool {
    matches!(
        status,
        SagaStatus::OrderCreated | SagaStatus::Completed | SagaStatus::Canceled | SagaStatus::Failed
    )
}

/// Applies one reply to the current saga state (spec §4.D's transition
/// table). Duplicate or out-of-order replies (caught by `ignores_replies`
/// and the per-status `_ => unchanged` arms below) are idempotent: the
/// returned record is byte-identical to the input and no commands are
/// emitted.
pub fn transition(order: &OrderSagaRecord, payment: &PaymentSagaRecord, reply: &Reply) -> StepOutcome {
    if ignores_replies(order.status) {
        return StepOutcome::unchanged(order, payment);
    }

    match (order.status, &reply.payload, &reply.outcome) {
        (SagaStatus::Pending, ReplyPayload::ReduceStock, Outcome::Success) => {
            let mut order = order.clone();
            order.status = SagaStatus::StockReduced;
            let command = Command::TakePayment {
                transaction_id: order.tid,
                user_email: order.user_email.clone(),
                amount: payment.amount,
                payment_method: order.payment_method,
            };
            StepOutcome {
                order,
                payment: payment.clone(),
                commands: vec![command],
                order_id_index: None,
            }
        }
        (SagaStatus::Pending, ReplyPayload::ReduceStock, Outcome::Failure(_)) => {
            let mut order = order.clone();
            order.status = SagaStatus::Failed;
            StepOutcome {
                order,
                payment: payment.clone(),
                commands: Vec::new(),
                order_id_index: None,
            }
        }

        (SagaStatus::StockReduced, ReplyPayload::TakePayment { payment_id }, Outcome::Success) => {
            let mut order = order.clone();
            order.payment_id = payment_id.clone();
            order.status = SagaStatus::PaymentTaken;
            let mut payment = payment.clone();
            payment.payment_status = PaymentStatus::Success;
            let command = Command::CreateOrder {
                transaction_id: order.tid,
                user_email: order.user_email.clone(),
                vendor_email: order.vendor_email.clone(),
                delivery_address: order.delivery_address.clone(),
                description: order.description.clone(),
                items: order.items.clone(),
            };
            StepOutcome {
                order,
                payment,
                commands: vec![command],
                order_id_index: None,
            }
        }
        (SagaStatus::StockReduced, ReplyPayload::TakePayment { .. }, Outcome::Failure(_)) => {
            let mut order = order.clone();
            order.status = SagaStatus::Failed;
            let mut payment = payment.clone();
            payment.payment_status = PaymentStatus::Failed;
            let command = Command::RollbackStock {
                transaction_id: order.tid,
            };
            StepOutcome {
                order,
                payment,
                commands: vec![command],
                order_id_index: None,
            }
        }

        (SagaStatus::PaymentTaken, ReplyPayload::CreateOrder { order_id: Some(order_id) }, Outcome::Success) => {
            let mut order = order.clone();
            order.order_id = Some(order_id.clone());
            order.status = SagaStatus::Completed;
            let mut payment = payment.clone();
            payment.order_id = Some(order_id.clone());
            // invariant 2: payment_id is set once the payment-taken reply
            // has been observed, which is a precondition of reaching PaymentTaken.
            let payment_id = order.payment_id.clone().unwrap_or_default();
            let commands = vec![
                Command::UpdateOrderPaymentId {
                    transaction_id: order.tid,
                    order_id: order_id.clone(),
                    payment_id: payment_id.clone(),
                },
                Command::UpdatePaymentOrderId {
                    transaction_id: order.tid,
                    payment_id,
                    order_id: order_id.clone(),
                },
            ];
            StepOutcome {
                order,
                payment,
                commands,
                order_id_index: Some(order_id.clone()),
            }
        }
        (SagaStatus::PaymentTaken, ReplyPayload::CreateOrder { .. }, Outcome::Failure(_)) => {
            let mut order = order.clone();
            order.status = SagaStatus::Failed;
            let mut payment = payment.clone();
            payment.payment_status = PaymentStatus::Cancelled;
            let payment_id = order.payment_id.clone().unwrap_or_default();
            let commands = vec![
                Command::RollbackStock {
                    transaction_id: order.tid,
                },
                Command::RollbackPayment {
                    transaction_id: order.tid,
                    payment_id,
                },
            ];
            StepOutcome {
                order,
                payment,
                commands,
                order_id_index: None,
            }
        }

        // Every other (state, reply) combination is either a duplicate of an
        // already-applied step or a reply arriving ahead of its expected
        // state: both are acknowledged and dropped unchanged.
        _ => StepOutcome::unchanged(order, payment),
    }
}

/// Applies an external cancel request to the current saga state (spec
/// §4.D's `cancel` column). Consults the current state and emits only the
/// rollbacks for steps already advanced (open question 3 of spec §9, and
/// testable property 4's compensation symmetry): stock only after
/// `StockReduced`, payment only after `PaymentTaken`, order only after
/// `Completed`.
pub fn cancel(order: &OrderSagaRecord, payment: &PaymentSagaRecord) -> StepOutcome {
    let payment_id = || order.payment_id.clone().unwrap_or_default();
    let order_id = || order.order_id.clone().unwrap_or_default();

    match order.status {
        SagaStatus::Pending => {
            let mut order = order.clone();
            order.status = SagaStatus::Canceled;
            StepOutcome {
                order,
                payment: payment.clone(),
                commands: Vec::new(),
                order_id_index: None,
            }
        }
        SagaStatus::StockReduced => {
            let mut order = order.clone();
            order.status = SagaStatus::Canceled;
            let commands = vec![Command::RollbackStock {
                transaction_id: order.tid,
            }];
            StepOutcome {
                order,
                payment: payment.clone(),
                commands,
                order_id_index: None,
            }
        }
        SagaStatus::PaymentTaken => {
            let mut order = order.clone();
            order.status = SagaStatus::Canceled;
            let mut payment = payment.clone();
            payment.payment_status = PaymentStatus::Cancelled;
            let commands = vec![
                Command::RollbackStock {
                    transaction_id: order.tid,
                },
                Command::RollbackPayment {
                    transaction_id: order.tid,
                    payment_id: payment_id(),
                },
            ];
            StepOutcome {
                order,
                payment,
                commands,
                order_id_index: None,
            }
        }
        SagaStatus::Completed => {
            let mut order = order.clone();
            order.status = SagaStatus::Canceled;
            let mut payment = payment.clone();
            payment.payment_status = PaymentStatus::Cancelled;
            let commands = vec![
                Command::RollbackStock {
                    transaction_id: order.tid,
                },
                Command::RollbackPayment {
                    transaction_id: order.tid,
                    payment_id: payment_id(),
                },
                Command::RollbackOrder {
                    transaction_id: order.tid,
                },
            ];
            let _ = order_id();
            StepOutcome {
                order,
                payment,
                commands,
                order_id_index: None,
            }
        }
        SagaStatus::OrderCreated | SagaStatus::Compensating | SagaStatus::Canceled | SagaStatus::Failed => {
            StepOutcome::unchanged(order, payment)
        }
    }
}

/// Σ quantity · unit_price, computed once at ingress time (testable
/// property 6). Exposed here so the coordinator and the ingress layer
/// share one implementation.
pub fn total_amount(order: &OrderSagaRecord) -> common::Money {
    order.total_amount()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Email, LineItem, Money, PaymentMethod, ProductId};

    fn items() -> Vec<LineItem> {
        vec![
            LineItem::new(ProductId::new("p1"), 2, Money::from_cents(1000)),
            LineItem::new(ProductId::new("p2"), 1, Money::from_cents(550)),
        ]
    }

    fn order(status: SagaStatus) -> OrderSagaRecord {
        OrderSagaRecord {
            tid: TransactionId::new(),
            user_email: Email::parse("buyer@example.com").unwrap(),
            vendor_email: Email::parse("vendor@example.com").unwrap(),
            delivery_address: "1 Infinite Loop".to_string(),
            description: None,
            status,
            items: items(),
            payment_method: PaymentMethod::CreditCard,
            payment_id: None,
            order_id: None,
        }
    }

    fn payment(order: &OrderSagaRecord) -> PaymentSagaRecord {
        PaymentSagaRecord {
            tid: order.tid,
            user_email: order.user_email.clone(),
            order_id: None,
            amount: order.total_amount(),
            payment_method: order.payment_method,
            payment_status: PaymentStatus::Pending,
        }
    }

    fn reply(tid: TransactionId, payload: ReplyPayload, outcome: Outcome) -> Reply {
        Reply {
            transaction_id: tid,
            outcome,
            payload,
        }
    }

    #[test]
    fn reduce_stock_success_advances_and_emits_take_payment() {
        let order = order(SagaStatus::Pending);
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(order.tid, ReplyPayload::ReduceStock, Outcome::Success),
        );
        assert_eq!(step.order.status, SagaStatus::StockReduced);
        assert_eq!(step.commands.len(), 1);
        assert!(matches!(step.commands[0], Command::TakePayment { .. }));
    }

    #[test]
    fn reduce_stock_failure_fails_with_no_commands() {
        let order = order(SagaStatus::Pending);
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(
                order.tid,
                ReplyPayload::ReduceStock,
                Outcome::Failure("error: out of stock".to_string()),
            ),
        );
        assert_eq!(step.order.status, SagaStatus::Failed);
        assert!(step.commands.is_empty());
    }

    #[test]
    fn take_payment_success_records_payment_id_and_emits_create_order() {
        let order = order(SagaStatus::StockReduced);
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(
                order.tid,
                ReplyPayload::TakePayment {
                    payment_id: Some("PAY-1".to_string()),
                },
                Outcome::Success,
            ),
        );
        assert_eq!(step.order.status, SagaStatus::PaymentTaken);
        assert_eq!(step.order.payment_id, Some("PAY-1".to_string()));
        assert!(matches!(step.commands[0], Command::CreateOrder { .. }));
    }

    #[test]
    fn take_payment_failure_rolls_back_stock_only() {
        let order = order(SagaStatus::StockReduced);
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(
                order.tid,
                ReplyPayload::TakePayment { payment_id: None },
                Outcome::Failure("error: card declined".to_string()),
            ),
        );
        assert_eq!(step.order.status, SagaStatus::Failed);
        assert_eq!(step.commands, vec![Command::RollbackStock { transaction_id: order.tid }]);
    }

    #[test]
    fn create_order_success_completes_and_emits_correlation_commands_in_order() {
        let mut order = order(SagaStatus::PaymentTaken);
        order.payment_id = Some("PAY-1".to_string());
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(
                order.tid,
                ReplyPayload::CreateOrder {
                    order_id: Some("ORD-1".to_string()),
                },
                Outcome::Success,
            ),
        );
        assert_eq!(step.order.status, SagaStatus::Completed);
        assert_eq!(step.order.order_id, Some("ORD-1".to_string()));
        assert_eq!(step.payment.order_id, Some("ORD-1".to_string()));
        assert_eq!(step.order_id_index, Some("ORD-1".to_string()));
        assert!(matches!(step.commands[0], Command::UpdateOrderPaymentId { .. }));
        assert!(matches!(step.commands[1], Command::UpdatePaymentOrderId { .. }));
    }

    #[test]
    fn create_order_failure_rolls_back_stock_and_payment_only() {
        let mut order = order(SagaStatus::PaymentTaken);
        order.payment_id = Some("PAY-1".to_string());
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(
                order.tid,
                ReplyPayload::CreateOrder { order_id: None },
                Outcome::Failure("error".to_string()),
            ),
        );
        assert_eq!(step.order.status, SagaStatus::Failed);
        assert_eq!(
            step.commands,
            vec![
                Command::RollbackStock { transaction_id: order.tid },
                Command::RollbackPayment {
                    transaction_id: order.tid,
                    payment_id: "PAY-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn duplicate_reply_for_terminal_saga_is_a_no_op() {
        let mut order = order(SagaStatus::Completed);
        order.order_id = Some("ORD-1".to_string());
        order.payment_id = Some("PAY-1".to_string());
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(
                order.tid,
                ReplyPayload::CreateOrder {
                    order_id: Some("ORD-1".to_string()),
                },
                Outcome::Success,
            ),
        );
        assert_eq!(step.order, order);
        assert!(step.commands.is_empty());
    }

    #[test]
    fn duplicate_reply_within_same_state_is_a_no_op() {
        let order = order(SagaStatus::StockReduced);
        let payment = payment(&order);
        let step = transition(
            &order,
            &payment,
            &reply(order.tid, ReplyPayload::ReduceStock, Outcome::Success),
        );
        assert_eq!(step.order, order);
        assert!(step.commands.is_empty());
    }

    #[test]
    fn cancel_from_pending_emits_nothing() {
        let order = order(SagaStatus::Pending);
        let payment = payment(&order);
        let step = cancel(&order, &payment);
        assert_eq!(step.order.status, SagaStatus::Canceled);
        assert!(step.commands.is_empty());
    }

    #[test]
    fn cancel_from_stock_reduced_rolls_back_stock_only() {
        let order = order(SagaStatus::StockReduced);
        let payment = payment(&order);
        let step = cancel(&order, &payment);
        assert_eq!(step.commands, vec![Command::RollbackStock { transaction_id: order.tid }]);
    }

    #[test]
    fn cancel_from_payment_taken_rolls_back_stock_and_payment_only() {
        let mut order = order(SagaStatus::PaymentTaken);
        order.payment_id = Some("PAY-1".to_string());
        let payment = payment(&order);
        let step = cancel(&order, &payment);
        assert_eq!(
            step.commands,
            vec![
                Command::RollbackStock { transaction_id: order.tid },
                Command::RollbackPayment {
                    transaction_id: order.tid,
                    payment_id: "PAY-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn cancel_from_completed_rolls_back_full_trio() {
        let mut order = order(SagaStatus::Completed);
        order.payment_id = Some("PAY-1".to_string());
        order.order_id = Some("ORD-1".to_string());
        let payment = payment(&order);
        let step = cancel(&order, &payment);
        assert_eq!(step.order.status, SagaStatus::Canceled);
        assert_eq!(
            step.commands,
            vec![
                Command::RollbackStock { transaction_id: order.tid },
                Command::RollbackPayment {
                    transaction_id: order.tid,
                    payment_id: "PAY-1".to_string()
                },
                Command::RollbackOrder { transaction_id: order.tid },
            ]
        );
    }

    #[test]
    fn cancel_on_already_canceled_saga_is_idempotent() {
        let order = order(SagaStatus::Canceled);
        let payment = payment(&order);
        let step = cancel(&order, &payment);
        assert_eq!(step.order, order);
        assert!(step.commands.is_empty());
    }
}
