use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::TransactionId;
use tokio::sync::RwLock;

use crate::{OrderSagaRecord, PaymentSagaRecord, ProductSagaRecord, Result, SagaStore};

struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory [`SagaStore`] for tests and local development.
///
/// Expiry is swept lazily on read: an entry past its TTL is treated as
/// absent and removed on next access, rather than reaped by a background
/// task.
#[derive(Default)]
pub struct InMemorySagaStore {
    orders: RwLock<HashMap<TransactionId, Expiring<OrderSagaRecord>>>,
    products: RwLock<HashMap<TransactionId, Expiring<ProductSagaRecord>>>,
    payments: RwLock<HashMap<TransactionId, Expiring<PaymentSagaRecord>>>,
    order_index: RwLock<HashMap<String, Expiring<TransactionId>>>,
}

impl InMemorySagaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

async fn get_live<K: std::hash::Hash + Eq + Clone, V: Clone>(
    map: &RwLock<HashMap<K, Expiring<V>>>,
    key: &K,
) -> Option<V> {
    {
        let guard = map.read().await;
        match guard.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
    }
    // Expired: drop it under a write lock.
    let mut guard = map.write().await;
    guard.remove(key);
    None
}

#[async_trait]
impl SagaStore for InMemorySagaStore {
    async fn put_order(&self, record: &OrderSagaRecord, ttl: Duration) -> Result<()> {
        self.orders
            .write()
            .await
            .insert(record.tid, Expiring::new(record.clone(), ttl));
        Ok(())
    }

    async fn get_order(&self, tid: TransactionId) -> Result<Option<OrderSagaRecord>> {
        Ok(get_live(&self.orders, &tid).await)
    }

    async fn delete_order(&self, tid: TransactionId) -> Result<()> {
        self.orders.write().await.remove(&tid);
        Ok(())
    }

    async fn put_product(&self, record: &ProductSagaRecord, ttl: Duration) -> Result<()> {
        self.products
            .write()
            .await
            .insert(record.tid, Expiring::new(record.clone(), ttl));
        Ok(())
    }

    async fn get_product(&self, tid: TransactionId) -> Result<Option<ProductSagaRecord>> {
        Ok(get_live(&self.products, &tid).await)
    }

    async fn delete_product(&self, tid: TransactionId) -> Result<()> {
        self.products.write().await.remove(&tid);
        Ok(())
    }

    async fn put_payment(&self, record: &PaymentSagaRecord, ttl: Duration) -> Result<()> {
        self.payments
            .write()
            .await
            .insert(record.tid, Expiring::new(record.clone(), ttl));
        Ok(())
    }

    async fn get_payment(&self, tid: TransactionId) -> Result<Option<PaymentSagaRecord>> {
        Ok(get_live(&self.payments, &tid).await)
    }

    async fn delete_payment(&self, tid: TransactionId) -> Result<()> {
        self.payments.write().await.remove(&tid);
        Ok(())
    }

    async fn put_order_index(&self, order_id: &str, tid: TransactionId, ttl: Duration) -> Result<()> {
        self.order_index
            .write()
            .await
            .insert(order_id.to_string(), Expiring::new(tid, ttl));
        Ok(())
    }

    async fn get_tid_by_order_id(&self, order_id: &str) -> Result<Option<TransactionId>> {
        Ok(get_live(&self.order_index, &order_id.to_string()).await)
    }
}
