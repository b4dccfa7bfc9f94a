//! Ledger feedback notifications published on
//! [`TOPIC_LEDGER_FEEDBACK`](crate::topics::TOPIC_LEDGER_FEEDBACK).

use serde::{Deserialize, Serialize};

use crate::types::{lenient_timestamp, PalletId, Timestamp};

/// Emitted after a breach has been recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerFeedback {
    BreachRecorded {
        pallet_id: PalletId,
        tx_hash: String,
        #[serde(deserialize_with = "lenient_timestamp::deserialize")]
        timestamp: Timestamp,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn feedback_wire_shape() {
        let fb = LedgerFeedback::BreachRecorded {
            pallet_id: "PALLET_001".to_string(),
            tx_hash: "00ff00ff00ff00ff".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(fb).unwrap();
        assert_eq!(json["type"], "breach_recorded");
        assert_eq!(json["pallet_id"], "PALLET_001");
        assert_eq!(json["tx_hash"], "00ff00ff00ff00ff");
        assert!(json["timestamp"].is_string());
    }
}
