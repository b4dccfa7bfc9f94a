//! The record appended to the ledger for each breach.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use coldchain_core::geo::Location;
use coldchain_core::types::{PalletId, Timestamp};

/// `previous_hash` of the first record in a chain.
pub const GENESIS_HASH: &str = "0000000000000000";

/// Record type for temperature breaches.
pub const RECORD_TEMPERATURE_BREACH: &str = "temperature_breach";

/// Status of a record once appended.
pub const STATUS_RECORDED: &str = "recorded";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub pallet_id: PalletId,
    pub temperature: f64,
    pub location: Location,
    pub timestamp: Timestamp,
    /// 16 lowercase hex characters.
    pub block_hash: String,
    /// Hash of the preceding record, or [`GENESIS_HASH`].
    pub previous_hash: String,
    pub status: String,
}

impl LedgerRecord {
    /// A breach record stamped with the current time.
    pub fn temperature_breach(
        pallet_id: &str,
        temperature: f64,
        location: Location,
        block_hash: String,
        previous_hash: String,
    ) -> Self {
        Self {
            record_type: RECORD_TEMPERATURE_BREACH.to_string(),
            pallet_id: pallet_id.to_string(),
            temperature,
            location,
            timestamp: Utc::now(),
            block_hash,
            previous_hash,
            status: STATUS_RECORDED.to_string(),
        }
    }
}
