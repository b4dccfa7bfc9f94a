//! Telemetry packets emitted on [`TOPIC_SENSOR_DATA`](crate::topics::TOPIC_SENSOR_DATA).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::Location;
use crate::types::{lenient_timestamp, PalletId, Timestamp};

/// Lifecycle status of a pallet as reported by its sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PalletStatus {
    InTransit,
    InWarehouse,
    Delivered,
    Spoiled,
    AwaitingDisposal,
}

impl PalletStatus {
    /// Wire representation, e.g. `"IN_TRANSIT"`.
    pub fn as_str(self) -> &'static str {
        match self {
            PalletStatus::InTransit => "IN_TRANSIT",
            PalletStatus::InWarehouse => "IN_WAREHOUSE",
            PalletStatus::Delivered => "DELIVERED",
            PalletStatus::Spoiled => "SPOILED",
            PalletStatus::AwaitingDisposal => "AWAITING_DISPOSAL",
        }
    }

    /// Whether the pallet has left active service (no further shipment
    /// activity is expected).
    pub fn is_final(self) -> bool {
        matches!(
            self,
            PalletStatus::Delivered | PalletStatus::Spoiled | PalletStatus::AwaitingDisposal
        )
    }
}

impl std::str::FromStr for PalletStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PalletStatus::InTransit,
            PalletStatus::InWarehouse,
            PalletStatus::Delivered,
            PalletStatus::Spoiled,
            PalletStatus::AwaitingDisposal,
        ]
        .into_iter()
        .find(|status| status.as_str() == s)
        .ok_or_else(|| CoreError::Validation(format!("unknown pallet status `{s}`")))
    }
}

impl std::fmt::Display for PalletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sensor reading for a pallet. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    pub pallet_id: PalletId,
    #[serde(deserialize_with = "lenient_timestamp::deserialize")]
    pub timestamp: Timestamp,
    pub location: Location,
    /// Degrees Celsius, rounded to two decimals.
    pub temperature: f64,
    pub status: PalletStatus,
}

/// Round a temperature reading to two decimals, as reported by the sensor.
pub fn round_reading(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
