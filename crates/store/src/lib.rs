//! Durable-enough, TTL-bounded key/value persistence for per-transaction
//! saga state, plus the secondary order-id → transaction-id index.
//!
//! The orchestrator is the sole writer (participant services never write
//! this store), so no multi-key atomicity is required: the coordinator
//! serializes steps per `tid`.

pub mod error;
pub mod memory;
pub mod records;
pub mod redis_store;

pub use error::{Result, StoreError};
pub use records::{OrderSagaRecord, PaymentSagaRecord, PaymentStatus, ProductSagaRecord, SagaStatus};

use std::time::Duration;

use async_trait::async_trait;
use common::TransactionId;

/// The default TTL for all saga records (spec §3, invariant 4).
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Durable-enough, TTL-bounded persistence for the three per-saga records
/// and the order-id index.
///
/// Every `put_*` resets the record's TTL (open question 4 of spec §9: every
/// write refreshes TTL, including late correlation writes). Reads reflect
/// the latest committed put for a key; no cross-key atomicity is provided
/// or required.
#[async_trait]
pub trait SagaStore: Send + Sync {
    async fn put_order(&self, record: &OrderSagaRecord, ttl: Duration) -> Result<()>;
    async fn get_order(&self, tid: TransactionId) -> Result<Option<OrderSagaRecord>>;
    async fn delete_order(&self, tid: TransactionId) -> Result<()>;

    async fn put_product(&self, record: &ProductSagaRecord, ttl: Duration) -> Result<()>;
    async fn get_product(&self, tid: TransactionId) -> Result<Option<ProductSagaRecord>>;
    async fn delete_product(&self, tid: TransactionId) -> Result<()>;

    async fn put_payment(&self, record: &PaymentSagaRecord, ttl: Duration) -> Result<()>;
    async fn get_payment(&self, tid: TransactionId) -> Result<Option<PaymentSagaRecord>>;
    async fn delete_payment(&self, tid: TransactionId) -> Result<()>;

    async fn put_order_index(&self, order_id: &str, tid: TransactionId, ttl: Duration) -> Result<()>;
    async fn get_tid_by_order_id(&self, order_id: &str) -> Result<Option<TransactionId>>;
}
