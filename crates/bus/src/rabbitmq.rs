use async_trait::async_trait;
use deadpool_lapin::{Config as PoolConfig, Pool, Runtime};
use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::BasicProperties;
use tokio_util::sync::CancellationToken;
use vocabulary::Envelope;

use crate::{Ack, BusError, Delivery, DeliveryStream, MessageBus, Result};

/// [`MessageBus`] backed by RabbitMQ via `lapin`, pooled with
/// `deadpool-lapin`.
///
/// Grounded on `message_publisher.py` (durable queue declaration,
/// `delivery_mode = 2`) and `event_consumer.py` (`basic_qos(prefetch_count=1)`,
/// manual ack/nack).
pub struct RabbitMqBus {
    pool: Pool,
    shutdown: CancellationToken,
}

impl RabbitMqBus {
    /// Connects using an `amqp://` URL, following the host/port/user/password
    /// environment configuration spec §6 lists.
    pub fn connect(amqp_url: &str) -> Result<Self> {
        let cfg = PoolConfig {
            url: Some(amqp_url.to_string()),
            ..Default::default()
        };
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| BusError::Config(e.to_string()))?;
        Ok(Self {
            pool,
            shutdown: CancellationToken::new(),
        })
    }
}

struct LapinAck {
    delivery: lapin::message::Delivery,
}

#[async_trait]
impl Ack for LapinAck {
    async fn ack(self: Box<Self>) -> Result<()> {
        self.delivery.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    async fn nack(self: Box<Self>, requeue: bool) -> Result<()> {
        self.delivery
            .nack(BasicNackOptions {
                requeue,
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageBus for RabbitMqBus {
    async fn publish(&self, queue_name: &str, envelope: &Envelope) -> Result<()> {
        let conn = self.pool.get().await?;
        let channel = conn.create_channel().await?;
        channel
            .queue_declare(queue_name, QueueDeclareOptions { durable: true, ..Default::default() }, FieldTable::default())
            .await?;

        let body = serde_json::to_vec(envelope)?;
        channel
            .basic_publish(
                "",
                queue_name,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await?
            .await?;
        Ok(())
    }

    async fn consume(&self, queue_name: &str) -> Result<DeliveryStream> {
        let conn = self.pool.get().await?;
        let channel = conn.create_channel().await?;
        channel
            .queue_declare(queue_name, QueueDeclareOptions { durable: true, ..Default::default() }, FieldTable::default())
            .await?;
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await?;

        let consumer = channel
            .basic_consume(
                queue_name,
                "orchestrator",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let shutdown = self.shutdown.clone();
        let stream = futures_util::stream::unfold(
            (consumer, shutdown),
            |(mut consumer, shutdown)| async move {
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => return None,
                        next = consumer.next() => {
                            let delivery = match next? {
                                Ok(delivery) => delivery,
                                Err(_) => continue,
                            };
                            let envelope: Envelope = match serde_json::from_slice(&delivery.data) {
                                Ok(envelope) => envelope,
                                Err(_) => {
                                    let _ = delivery.nack(BasicNackOptions { requeue: false, ..Default::default() }).await;
                                    continue;
                                }
                            };
                            let ack = Box::new(LapinAck { delivery });
                            return Some((Delivery { envelope, ack }, (consumer, shutdown)));
                        }
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
