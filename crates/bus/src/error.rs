use thiserror::Error;

/// Errors surfaced by a [`crate::MessageBus`] implementation.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_lapin::PoolError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("bus is shut down")]
    Closed,

    #[error("bus configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BusError>;
