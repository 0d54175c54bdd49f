//! Publish durable commands to named queues; consume the single reply
//! queue with per-message acknowledgement and prefetch = 1.
//!
//! Queue names are fixed (see [`vocabulary::queues`]) and always declared
//! durable; messages are always published persistent. The coordinator
//! acknowledges a delivery only after its state transition has been both
//! persisted and published — see [`Ack`].

pub mod error;
pub mod memory;
pub mod rabbitmq;

pub use error::{BusError, Result};

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use vocabulary::Envelope;

/// A handle for acknowledging or rejecting one delivery.
///
/// Consumed by value: a delivery can be acked or nacked exactly once.
#[async_trait]
pub trait Ack: Send + Sync {
    /// Confirms the message was fully processed; the bus will not redeliver it.
    async fn ack(self: Box<Self>) -> Result<()>;

    /// Rejects the message. `requeue = true` asks the bus to redeliver it
    /// (the transient-failure path); `requeue = false` drops it for good
    /// (not currently used by the coordinator, which only ever wants
    /// redelivery on failure).
    async fn nack(self: Box<Self>, requeue: bool) -> Result<()>;
}

/// One inbound message plus the means to acknowledge it.
pub struct Delivery {
    pub envelope: Envelope,
    pub ack: Box<dyn Ack>,
}

pub type DeliveryStream = Pin<Box<dyn Stream<Item = Delivery> + Send>>;

/// Publish/consume contract for the four fixed queues.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes a durable, persistent message to `queue_name`.
    async fn publish(&self, queue_name: &str, envelope: &Envelope) -> Result<()>;

    /// Begins consuming `queue_name` with prefetch = 1. The returned stream
    /// yields one delivery at a time; the caller must ack or nack each
    /// delivery before the next is of any use (the bus enforces prefetch,
    /// not this stream).
    async fn consume(&self, queue_name: &str) -> Result<DeliveryStream>;

    /// Thread-safe request to stop consuming. Any in-flight `consume`
    /// stream unblocks within a bounded time.
    async fn shutdown(&self) -> Result<()>;
}
