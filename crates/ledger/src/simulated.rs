//! In-memory, append-only mock chain.

use async_trait::async_trait;
use tokio::sync::Mutex;

use coldchain_core::geo::Location;

use crate::backend::BreachLedger;
use crate::error::LedgerError;
use crate::hash::{is_valid_block_hash, HashSource, RandomHashSource};
use crate::record::{LedgerRecord, GENESIS_HASH};

struct Chain {
    records: Vec<LedgerRecord>,
    hashes: Box<dyn HashSource>,
}

/// Ledger that links each record to its predecessor by hash.
///
/// Appends are serialized by a mutex, so every record's `previous_hash`
/// equals the `block_hash` of the record before it even under concurrent
/// callers.
pub struct SimulatedLedger {
    chain: Mutex<Chain>,
}

impl SimulatedLedger {
    pub fn new(hashes: Box<dyn HashSource>) -> Self {
        tracing::info!("Breach ledger initialized in simulation mode");
        Self {
            chain: Mutex::new(Chain {
                records: Vec::new(),
                hashes,
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.chain.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new(Box::new(RandomHashSource))
    }
}

#[async_trait]
impl BreachLedger for SimulatedLedger {
    async fn record_temperature_breach(
        &self,
        pallet_id: &str,
        temperature: f64,
        location: &Location,
    ) -> Result<String, LedgerError> {
        let mut chain = self.chain.lock().await;

        let block_hash = chain.hashes.next_hash();
        if !is_valid_block_hash(&block_hash) {
            tracing::error!(
                pallet_id,
                hash = %block_hash,
                "Failed to record temperature breach: invalid block hash"
            );
            return Err(LedgerError::InvalidHash(block_hash));
        }

        let previous_hash = chain
            .records
            .last()
            .map_or_else(|| GENESIS_HASH.to_string(), |r| r.block_hash.clone());

        chain.records.push(LedgerRecord::temperature_breach(
            pallet_id,
            temperature,
            *location,
            block_hash.clone(),
            previous_hash,
        ));

        tracing::info!(
            pallet_id,
            temperature,
            block_hash = %block_hash,
            "SIMULATION: Recorded temperature breach"
        );
        Ok(block_hash)
    }

    async fn chain(&self) -> Vec<LedgerRecord> {
        self.chain.lock().await.records.clone()
    }

    fn backend_name(&self) -> &'static str {
        "simulation"
    }
}
