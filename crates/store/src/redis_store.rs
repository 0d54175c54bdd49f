use std::time::Duration;

use async_trait::async_trait;
use common::TransactionId;
use redis::{AsyncCommands, Client};

use crate::{OrderSagaRecord, PaymentSagaRecord, ProductSagaRecord, Result, SagaStore};

fn order_key(tid: TransactionId) -> String {
    format!("order_saga:{tid}")
}

fn product_key(tid: TransactionId) -> String {
    format!("product_saga:{tid}")
}

fn payment_key(tid: TransactionId) -> String {
    format!("payment_saga:{tid}")
}

fn order_index_key(order_id: &str) -> String {
    format!("order_id:{order_id}")
}

/// Redis-backed [`SagaStore`], grounded on the TTL/key scheme of
/// `redis_saga_store.py`: `SET key value EX ttl` for puts, `GET`/`DEL` for
/// reads and deletes, and a plain string value for the order-id index.
pub struct RedisSagaStore {
    client: Client,
}

impl RedisSagaStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn open(url: &str) -> Result<Self> {
        Ok(Self::new(Client::open(url)?))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl SagaStore for RedisSagaStore {
    async fn put_order(&self, record: &OrderSagaRecord, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(record)?;
        let _: () = conn
            .set_ex(order_key(record.tid), payload, ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get_order(&self, tid: TransactionId) -> Result<Option<OrderSagaRecord>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(order_key(tid)).await?;
        Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    async fn delete_order(&self, tid: TransactionId) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(order_key(tid)).await?;
        Ok(())
    }

    async fn put_product(&self, record: &ProductSagaRecord, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(record)?;
        let _: () = conn
            .set_ex(product_key(record.tid), payload, ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get_product(&self, tid: TransactionId) -> Result<Option<ProductSagaRecord>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(product_key(tid)).await?;
        Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    async fn delete_product(&self, tid: TransactionId) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(product_key(tid)).await?;
        Ok(())
    }

    async fn put_payment(&self, record: &PaymentSagaRecord, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(record)?;
        let _: () = conn
            .set_ex(payment_key(record.tid), payload, ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get_payment(&self, tid: TransactionId) -> Result<Option<PaymentSagaRecord>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(payment_key(tid)).await?;
        Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    async fn delete_payment(&self, tid: TransactionId) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(payment_key(tid)).await?;
        Ok(())
    }

    async fn put_order_index(&self, order_id: &str, tid: TransactionId, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(order_index_key(order_id), tid.to_string(), ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get_tid_by_order_id(&self, order_id: &str) -> Result<Option<TransactionId>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(order_index_key(order_id)).await?;
        Ok(match raw {
            Some(s) => Some(TransactionId::parse(&s).map_err(|e| {
                crate::StoreError::Unavailable(format!("corrupt order index entry: {e}"))
            })?),
            None => None,
        })
    }
}
