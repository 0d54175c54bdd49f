use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vocabulary::Envelope;

use crate::{Ack, Delivery, DeliveryStream, MessageBus, Result};

struct Queue {
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Option<mpsc::UnboundedReceiver<Envelope>>,
}

/// In-process [`MessageBus`] for tests and local development: one
/// unbounded channel per queue name, no real durability.
///
/// Every publish is also appended to an audit log so tests can assert on
/// the exact sequence of commands a saga emitted without needing to
/// consume every outbound queue themselves.
pub struct InMemoryMessageBus {
    queues: Mutex<HashMap<String, Queue>>,
    published: Mutex<Vec<(String, Envelope)>>,
    shutdown: CancellationToken,
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Every envelope published so far, in publish order, across all queues.
    pub fn published(&self) -> Vec<(String, Envelope)> {
        self.published.lock().unwrap().clone()
    }

    /// Just the event names published so far, for compact test assertions.
    pub fn published_events(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, env)| env.event.clone())
            .collect()
    }

    fn sender(&self, queue_name: &str) -> mpsc::UnboundedSender<Envelope> {
        let mut queues = self.queues.lock().unwrap();
        let queue = queues.entry(queue_name.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            Queue {
                sender: tx,
                receiver: Some(rx),
            }
        });
        queue.sender.clone()
    }

    fn take_receiver(&self, queue_name: &str) -> mpsc::UnboundedReceiver<Envelope> {
        let mut queues = self.queues.lock().unwrap();
        let queue = queues.entry(queue_name.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            Queue {
                sender: tx,
                receiver: Some(rx),
            }
        });
        queue
            .receiver
            .take()
            .expect("queue already has an active consumer")
    }
}

struct MemoryAck {
    envelope: Envelope,
    sender: mpsc::UnboundedSender<Envelope>,
}

#[async_trait]
impl Ack for MemoryAck {
    async fn ack(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn nack(self: Box<Self>, requeue: bool) -> Result<()> {
        if requeue {
            let _ = self.sender.send(self.envelope);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, queue_name: &str, envelope: &Envelope) -> Result<()> {
        let sender = self.sender(queue_name);
        self.published
            .lock()
            .unwrap()
            .push((queue_name.to_string(), envelope.clone()));
        let _ = sender.send(envelope.clone());
        Ok(())
    }

    async fn consume(&self, queue_name: &str) -> Result<DeliveryStream> {
        let receiver = self.take_receiver(queue_name);
        let sender = self.sender(queue_name);
        let shutdown = self.shutdown.clone();
        let stream = futures_util::stream::unfold(
            (receiver, sender, shutdown),
            |(mut receiver, sender, shutdown)| async move {
                tokio::select! {
                    _ = shutdown.cancelled() => None,
                    maybe = receiver.recv() => {
                        let envelope = maybe?;
                        let ack = Box::new(MemoryAck {
                            envelope: envelope.clone(),
                            sender: sender.clone(),
                        });
                        Some((Delivery { envelope, ack }, (receiver, sender, shutdown)))
                    }
                }
            },
        );
        Ok(Box::pin(stream))
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdown.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TransactionId;
    use futures_util::StreamExt;

    fn envelope(event: &str) -> Envelope {
        Envelope::command(event, TransactionId::new(), serde_json::json!({}))
    }

    #[tokio::test]
    async fn publish_then_consume_delivers_in_order() {
        let bus = InMemoryMessageBus::new();
        bus.publish("products_queue", &envelope("reduce_stock")).await.unwrap();
        bus.publish("products_queue", &envelope("rollback_stock")).await.unwrap();

        let mut stream = bus.consume("products_queue").await.unwrap();
        let first = stream.next().await.unwrap();
        assert_eq!(first.envelope.event, "reduce_stock");
        first.ack.ack().await.unwrap();

        let second = stream.next().await.unwrap();
        assert_eq!(second.envelope.event, "rollback_stock");
        second.ack.ack().await.unwrap();
    }

    #[tokio::test]
    async fn nack_with_requeue_redelivers() {
        let bus = InMemoryMessageBus::new();
        bus.publish("orchestration_queue", &envelope("take_payment"))
            .await
            .unwrap();

        let mut stream = bus.consume("orchestration_queue").await.unwrap();
        let delivery = stream.next().await.unwrap();
        delivery.ack.nack(true).await.unwrap();

        let redelivered = stream.next().await.unwrap();
        assert_eq!(redelivered.envelope.event, "take_payment");
    }

    #[tokio::test]
    async fn published_audit_log_captures_every_queue() {
        let bus = InMemoryMessageBus::new();
        bus.publish("products_queue", &envelope("reduce_stock")).await.unwrap();
        bus.publish("payment_queue", &envelope("take_payment")).await.unwrap();
        assert_eq!(bus.published_events(), vec!["reduce_stock", "take_payment"]);
    }

    #[tokio::test]
    async fn shutdown_unblocks_consume() {
        let bus = InMemoryMessageBus::new();
        let mut stream = bus.consume("orchestration_queue").await.unwrap();
        bus.shutdown().await.unwrap();
        assert!(stream.next().await.is_none());
    }
}
