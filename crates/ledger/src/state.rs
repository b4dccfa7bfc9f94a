//! Keyed pallet state store.
//!
//! Each pallet lives under `pallet:<id>` as a flat map of string fields.
//! Updates merge into the existing map and stamp `last_updated`.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

/// Key prefix shared by every pallet entry.
pub const PALLET_KEY_PREFIX: &str = "pallet:";

/// Field stamped on every update.
pub const LAST_UPDATED_FIELD: &str = "last_updated";

/// All fields stored for one pallet.
pub type PalletSnapshot = BTreeMap<String, String>;

pub fn pallet_key(pallet_id: &str) -> String {
    format!("{PALLET_KEY_PREFIX}{pallet_id}")
}

#[derive(Default)]
pub struct PalletStateStore {
    entries: RwLock<BTreeMap<String, PalletSnapshot>>,
}

impl PalletStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `fields` into the pallet's entry, creating it if needed.
    pub fn update_pallet<I, K, V>(&self, pallet_id: &str, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(pallet_key(pallet_id)).or_default();
        for (k, v) in fields {
            entry.insert(k.into(), v.into());
        }
        entry.insert(LAST_UPDATED_FIELD.to_string(), Utc::now().to_rfc3339());
    }

    pub fn get_pallet(&self, pallet_id: &str) -> Option<PalletSnapshot> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pallet_key(pallet_id))
            .cloned()
    }

    /// Every pallet entry, in key order.
    pub fn list_pallets(&self) -> Vec<PalletSnapshot> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range(PALLET_KEY_PREFIX.to_string()..)
            .take_while(|(key, _)| key.starts_with(PALLET_KEY_PREFIX))
            .map(|(_, snapshot)| snapshot.clone())
            .collect()
    }
}
