//! Fixed queue names. Exactly four queues exist in this system.

/// Outbound commands to the inventory service.
pub const PRODUCTS_QUEUE: &str = "products_queue";

/// Outbound commands to the order service.
pub const ORDERS_QUEUE: &str = "orders_queue";

/// Outbound commands to the payment service.
pub const PAYMENT_QUEUE: &str = "payment_queue";

/// Inbound replies from all participants.
pub const ORCHESTRATION_QUEUE: &str = "orchestration_queue";
