//! Shared domain types for the cold-chain monitoring pipeline.
//!
//! Everything in this crate is pure data and pure functions: the wire
//! messages exchanged on the bus, the pallet/warehouse model, topic names,
//! and the small numeric helpers used by more than one component. It has
//! no internal dependencies so every other crate can depend on it.

pub mod alert;
pub mod command;
pub mod error;
pub mod feedback;
pub mod geo;
pub mod telemetry;
pub mod topics;
pub mod types;
pub mod validation;
pub mod warehouse;
