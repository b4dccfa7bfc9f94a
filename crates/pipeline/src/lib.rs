//! Cold-chain pipeline runtime.
//!
//! Wires the simulator, agents and ledger onto one event bus, keeps a
//! keyed view of every pallet, and serves a JSON status API. The binary in
//! `main.rs` only assembles these pieces; integration tests use the same
//! building blocks.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod response;
pub mod routes;
pub mod runtime;
pub mod state;
pub mod supervisor;
pub mod tracker;
