//! Alert messages carried on [`TOPIC_ALERTS`](crate::topics::TOPIC_ALERTS).
//!
//! Alerts are transient: they exist only on the bus and are never persisted
//! by it. The `type` field is the discriminant; unknown discriminants fail
//! to deserialize rather than being silently accepted.

use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::types::{lenient_timestamp, PalletId, Timestamp};

/// Wire discriminant for [`Alert::TemperatureBreach`].
pub const ALERT_TEMPERATURE_BREACH: &str = "temperature_breach";

/// Wire discriminant for [`Alert::Spoilage`].
pub const ALERT_SPOILAGE: &str = "spoilage";

/// Wire discriminant for [`Alert::RerouteFailed`].
pub const ALERT_REROUTE_FAILED: &str = "reroute_failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Alert {
    /// A reading exceeded the configured temperature threshold.
    TemperatureBreach {
        pallet_id: PalletId,
        temperature: f64,
        location: Location,
        #[serde(deserialize_with = "lenient_timestamp::deserialize")]
        timestamp: Timestamp,
    },
    /// The pallet reported `SPOILED`.
    Spoilage {
        pallet_id: PalletId,
        location: Location,
        #[serde(deserialize_with = "lenient_timestamp::deserialize")]
        timestamp: Timestamp,
    },
    /// No warehouse could take a breaching pallet.
    RerouteFailed {
        pallet_id: PalletId,
        reason: String,
        #[serde(deserialize_with = "lenient_timestamp::deserialize")]
        timestamp: Timestamp,
        original_alert: Box<Alert>,
    },
}

impl Alert {
    /// The wire discriminant of this alert.
    pub fn kind(&self) -> &'static str {
        match self {
            Alert::TemperatureBreach { .. } => ALERT_TEMPERATURE_BREACH,
            Alert::Spoilage { .. } => ALERT_SPOILAGE,
            Alert::RerouteFailed { .. } => ALERT_REROUTE_FAILED,
        }
    }

    pub fn pallet_id(&self) -> &str {
        match self {
            Alert::TemperatureBreach { pallet_id, .. }
            | Alert::Spoilage { pallet_id, .. }
            | Alert::RerouteFailed { pallet_id, .. } => pallet_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn breach() -> Alert {
        Alert::TemperatureBreach {
            pallet_id: "PALLET_001".to_string(),
            temperature: 9.0,
            location: Location::new(52.4, 9.1),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn breach_alert_wire_shape() {
        let json = serde_json::to_value(breach()).unwrap();
        assert_eq!(json["type"], "temperature_breach");
        assert_eq!(json["pallet_id"], "PALLET_001");
        assert_eq!(json["temperature"], 9.0);
        assert_eq!(json["location"]["lat"], 52.4);
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn spoilage_alert_has_no_temperature() {
        let alert = Alert::Spoilage {
            pallet_id: "PALLET_001".to_string(),
            location: Location::new(1.0, 2.0),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "spoilage");
        assert!(json.get("temperature").is_none());
        assert_eq!(alert.kind(), ALERT_SPOILAGE);
    }

    #[test]
    fn reroute_failed_embeds_original_alert() {
        let alert = Alert::RerouteFailed {
            pallet_id: "PALLET_001".to_string(),
            reason: "No available warehouses".to_string(),
            timestamp: Utc::now(),
            original_alert: Box::new(breach()),
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "reroute_failed");
        assert_eq!(json["original_alert"]["type"], "temperature_breach");
        assert_eq!(alert.pallet_id(), "PALLET_001");
    }

    #[test]
    fn unknown_alert_type_is_rejected() {
        let raw = r#"{"type":"humidity","pallet_id":"P","timestamp":"2024-05-01T12:00:00Z"}"#;
        assert!(serde_json::from_str::<Alert>(raw).is_err());
    }

    #[test]
    fn missing_pallet_id_is_rejected() {
        let raw = r#"{"type":"spoilage","location":{"lat":1.0,"lon":2.0},
            "timestamp":"2024-05-01T12:00:00Z"}"#;
        assert!(serde_json::from_str::<Alert>(raw).is_err());
    }
}
