//! Canonical on-wire command/reply schema shared with participant services.
//!
//! Every message that crosses the message bus is a single self-describing
//! [`Envelope`]. Outbound commands are built from the closed [`Command`]
//! enum; inbound replies are parsed into the closed [`Reply`] enum. Both
//! enums are exhaustively matched at the call sites that need them, in
//! place of the dynamic event-name dispatch of the system this was
//! distilled from.

pub mod command;
pub mod envelope;
pub mod queues;
pub mod reply;

pub use command::Command;
pub use envelope::Envelope;
pub use queues::{ORCHESTRATION_QUEUE, ORDERS_QUEUE, PAYMENT_QUEUE, PRODUCTS_QUEUE};
pub use reply::{Outcome, Reply, ReplyParseError, ReplyPayload};
