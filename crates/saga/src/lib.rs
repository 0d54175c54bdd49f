//! Saga orchestration for a three-step distributed order transaction:
//! reduce stock, take payment, create order. If any step fails, or an
//! external cancel request arrives, the steps already advanced are
//! compensated in reverse.
//!
//! [`state::transition`] and [`state::cancel`] are pure; [`coordinator`]
//! glues them to the [`store::SagaStore`] and [`bus::MessageBus`]
//! collaborators injected into it.

pub mod coordinator;
pub mod error;
pub mod state;

pub use coordinator::SagaCoordinator;
pub use error::SagaError;
