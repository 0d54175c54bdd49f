//! Saga error types.

use common::TransactionId;
use thiserror::Error;

/// Errors that can occur during saga coordination.
#[derive(Debug, Error)]
pub enum SagaError {
    /// `start_order` was called with no line items.
    #[error("order has no items")]
    EmptyItems,

    /// A line item had an invalid quantity or price.
    #[error("invalid line item: {0}")]
    InvalidLineItem(String),

    /// `cancel_order` was called with an `order_id` not present in the index.
    #[error("unknown order id: {0}")]
    UnknownOrderId(String),

    /// The order-id index pointed at a `tid` with no saga record.
    #[error("saga record missing for transaction {0}")]
    MissingRecord(TransactionId),

    #[error("store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("bus error: {0}")]
    Bus(#[from] bus::BusError),

    #[error("malformed reply: {0}")]
    ReplyParse(#[from] vocabulary::ReplyParseError),
}

pub type Result<T> = std::result::Result<T, SagaError>;
