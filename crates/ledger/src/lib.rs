//! Breach ledger backends and the keyed pallet state store.
//!
//! Every backend implements [`BreachLedger`]. The simulation backend keeps
//! an append-only hash chain in memory; the RPC backend submits records to
//! a JSON-RPC settlement node. [`NotifyingLedger`] wraps either one and
//! announces successful records on the bus.

pub mod backend;
pub mod error;
pub mod hash;
pub mod notifying;
pub mod record;
pub mod rpc;
pub mod simulated;
pub mod state;

pub use backend::BreachLedger;
pub use error::LedgerError;
pub use hash::{is_valid_block_hash, HashSource, RandomHashSource, ScriptedHashSource};
pub use notifying::NotifyingLedger;
pub use record::{LedgerRecord, GENESIS_HASH};
pub use rpc::{RpcLedger, RpcLedgerConfig};
pub use simulated::SimulatedLedger;
pub use state::{PalletSnapshot, PalletStateStore};
