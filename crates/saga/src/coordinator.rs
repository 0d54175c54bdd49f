//! Glues the [`store::SagaStore`] and [`bus::MessageBus`] collaborators to
//! the pure [`crate::state`] transition function: ingress handlers
//! (`start_order`, `cancel_order`) and the reply-queue consumer loop.

use std::sync::Arc;

use bus::{Delivery, MessageBus};
use common::{Email, LineItem, PaymentMethod, TransactionId};
use futures_util::StreamExt;
use store::{OrderSagaRecord, PaymentSagaRecord, PaymentStatus, SagaStatus, SagaStore, DEFAULT_TTL};
use tokio_util::sync::CancellationToken;
use vocabulary::{Command, Reply, ReplyParseError};

use crate::error::{Result, SagaError};
use crate::state;

/// A validated request to start a new order-fulfillment saga. Constructed
/// by the ingress layer after it has already rejected malformed input
/// (bad `payment_method`, malformed emails) at the type boundary.
pub struct StartOrderRequest {
    pub user_email: Email,
    pub vendor_email: Email,
    pub delivery_address: String,
    pub description: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<LineItem>,
}

/// Orchestrates the order fulfillment saga: owns a store and bus handle
/// rather than relying on module-level singletons (spec §9's "shared
/// mutable state via module-level singletons" redesign note), so tests can
/// inject in-memory collaborators.
pub struct SagaCoordinator<S, B> {
    store: Arc<S>,
    bus: Arc<B>,
}

impl<S, B> SagaCoordinator<S, B>
where
    S: SagaStore,
    B: MessageBus,
{
    pub fn new(store: Arc<S>, bus: Arc<B>) -> Self {
        Self { store, bus }
    }

    /// Mints a fresh `tid`, persists the initial records in state
    /// `Pending`, and publishes `reduce_stock`. Returns immediately;
    /// completion is observed asynchronously via the reply queue.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn start_order(&self, request: StartOrderRequest) -> Result<TransactionId> {
        if request.items.is_empty() {
            return Err(SagaError::EmptyItems);
        }
        for item in &request.items {
            if item.quantity == 0 {
                return Err(SagaError::InvalidLineItem(format!(
                    "{}: quantity must be at least 1",
                    item.product_id
                )));
            }
            if item.unit_price.is_negative() {
                return Err(SagaError::InvalidLineItem(format!(
                    "{}: unit_price must not be negative",
                    item.product_id
                )));
            }
        }

        let tid = TransactionId::new();
        let order = OrderSagaRecord {
            tid,
            user_email: request.user_email.clone(),
            vendor_email: request.vendor_email,
            delivery_address: request.delivery_address,
            description: request.description,
            status: SagaStatus::Pending,
            items: request.items.clone(),
            payment_method: request.payment_method,
            payment_id: None,
            order_id: None,
        };
        let amount = state::total_amount(&order);
        let payment = PaymentSagaRecord {
            tid,
            user_email: request.user_email,
            order_id: None,
            amount,
            payment_method: request.payment_method,
            payment_status: PaymentStatus::Pending,
        };

        self.store.put_order(&order, DEFAULT_TTL).await?;
        self.store
            .put_product(&store::ProductSagaRecord { tid, items: request.items }, DEFAULT_TTL)
            .await?;
        self.store.put_payment(&payment, DEFAULT_TTL).await?;

        self.publish(Command::ReduceStock {
            transaction_id: tid,
            items: order.items.clone(),
        })
        .await?;

        metrics::counter!("saga_starts_total").increment(1);
        tracing::info!(%tid, "saga started");
        Ok(tid)
    }

    /// Resolves `tid` via the order-id index and applies the `cancel`
    /// column of the transition table.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let tid = self
            .store
            .get_tid_by_order_id(order_id)
            .await?
            .ok_or_else(|| SagaError::UnknownOrderId(order_id.to_string()))?;

        let order = self
            .store
            .get_order(tid)
            .await?
            .ok_or(SagaError::MissingRecord(tid))?;
        let payment = self
            .store
            .get_payment(tid)
            .await?
            .ok_or(SagaError::MissingRecord(tid))?;

        let outcome = state::cancel(&order, &payment);
        self.apply_outcome(tid, outcome).await?;

        metrics::counter!("saga_canceled_total").increment(1);
        tracing::warn!(%tid, %order_id, "saga cancellation started");
        Ok(())
    }

    /// The reply-queue consumer loop: drains `orchestration_queue` one
    /// delivery at a time until `cancellation` fires or the bus itself
    /// shuts down.
    pub async fn run(&self, cancellation: CancellationToken) -> Result<()> {
        let mut deliveries = self.bus.consume(vocabulary::ORCHESTRATION_QUEUE).await?;
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    tracing::info!("saga consumer shutting down");
                    return Ok(());
                }
                next = deliveries.next() => {
                    match next {
                        None => return Ok(()),
                        Some(delivery) => self.process_delivery(delivery).await,
                    }
                }
            }
        }
    }

    #[tracing::instrument(skip(self, delivery), fields(event = %delivery.envelope.event))]
    async fn process_delivery(&self, delivery: Delivery) {
        let Delivery { envelope, ack } = delivery;
        let reply = match Reply::from_envelope(envelope) {
            Ok(reply) => reply,
            Err(ReplyParseError::UnknownEvent(event)) => {
                tracing::warn!(event, "unknown event type, acknowledged and dropped");
                let _ = ack.ack().await;
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed reply, acknowledged and dropped");
                let _ = ack.ack().await;
                return;
            }
        };

        match self.handle_reply(&reply).await {
            Ok(()) => {
                let _ = ack.ack().await;
            }
            Err(SagaError::MissingRecord(tid)) => {
                tracing::warn!(%tid, "reply for expired or unknown saga, acknowledged and dropped");
                let _ = ack.ack().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to process reply, requesting redelivery");
                let _ = ack.nack(true).await;
            }
        }
    }

    async fn handle_reply(&self, reply: &Reply) -> Result<()> {
        let tid = reply.transaction_id;
        let order = self
            .store
            .get_order(tid)
            .await?
            .ok_or(SagaError::MissingRecord(tid))?;
        let payment = self
            .store
            .get_payment(tid)
            .await?
            .ok_or(SagaError::MissingRecord(tid))?;

        let outcome = state::transition(&order, &payment, reply);
        let completed = outcome.order.status == SagaStatus::Completed;
        self.apply_outcome(tid, outcome).await?;

        if completed {
            metrics::counter!("saga_completed_total").increment(1);
            tracing::info!(%tid, "saga completed");
        }
        Ok(())
    }

    /// Persists the resulting record(s) and publishes the outbound commands
    /// in order. Per spec §4.E: acknowledgement happens only after both
    /// succeed, so this is called before the delivery is acked.
    async fn apply_outcome(&self, tid: TransactionId, outcome: state::StepOutcome) -> Result<()> {
        self.store.put_order(&outcome.order, DEFAULT_TTL).await?;
        self.store.put_payment(&outcome.payment, DEFAULT_TTL).await?;
        if let Some(order_id) = &outcome.order_id_index {
            self.store.put_order_index(order_id, tid, DEFAULT_TTL).await?;
        }
        for command in outcome.commands {
            self.publish(command).await?;
        }
        Ok(())
    }

    async fn publish(&self, command: Command) -> Result<()> {
        let envelope = command.to_envelope();
        self.bus.publish(command.target_queue(), &envelope).await?;
        Ok(())
    }
}
