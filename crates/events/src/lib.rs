//! Topic-based event bus for the cold-chain pipeline.
//!
//! This crate provides the messaging building blocks every component
//! shares:
//!
//! - [`EventBus`]: in-process publish/subscribe hub with one
//!   `tokio::sync::broadcast` channel per topic.
//! - [`Subscription`]: a multi-topic receiver with a timeout-bounded
//!   [`poll`](Subscription::poll).
//! - [`consumer`]: the cancellable poll loop agents run on.

pub mod bus;
pub mod consumer;
pub mod error;
pub mod subscription;

pub use bus::{BusMessage, EventBus};
pub use consumer::{run_consumer, MessageHandler, PollConfig};
pub use error::BusError;
pub use subscription::Subscription;
