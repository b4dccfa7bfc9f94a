//! Commands carried on [`TOPIC_COMMANDS`](crate::topics::TOPIC_COMMANDS) and
//! [`TOPIC_LOGISTICS_COMMANDS`](crate::topics::TOPIC_LOGISTICS_COMMANDS).

use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::types::{lenient_timestamp, PalletId, Timestamp};

/// Wire discriminant for [`Command::Reroute`].
pub const COMMAND_REROUTE: &str = "reroute";

/// Wire discriminant for [`Command::Dispose`].
pub const COMMAND_DISPOSE: &str = "dispose";

/// Wire discriminant for [`Command::WarehouseStatus`].
pub const COMMAND_WAREHOUSE_STATUS: &str = "warehouse_status";

/// Reason attached to every dispose command.
pub const DISPOSE_REASON: &str = "Goods spoiled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Send a pallet to `warehouse` at `new_location`.
    Reroute {
        pallet_id: PalletId,
        warehouse: String,
        new_location: Location,
        /// Where the pallet was when the breach was reported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_location: Option<Location>,
        /// The breaching temperature that triggered the reroute.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f64>,
        reason: String,
        #[serde(deserialize_with = "lenient_timestamp::deserialize")]
        timestamp: Timestamp,
    },
    /// Mark a pallet's goods for disposal.
    Dispose {
        pallet_id: PalletId,
        reason: String,
        #[serde(deserialize_with = "lenient_timestamp::deserialize")]
        timestamp: Timestamp,
    },
    /// Toggle a warehouse's availability in the logistics registry.
    WarehouseStatus {
        warehouse: String,
        status: bool,
        #[serde(
            default,
            deserialize_with = "lenient_timestamp::deserialize_option",
            skip_serializing_if = "Option::is_none"
        )]
        timestamp: Option<Timestamp>,
    },
}

impl Command {
    /// The wire discriminant of this command.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Reroute { .. } => COMMAND_REROUTE,
            Command::Dispose { .. } => COMMAND_DISPOSE,
            Command::WarehouseStatus { .. } => COMMAND_WAREHOUSE_STATUS,
        }
    }

    /// The pallet this command is addressed to, if any.
    pub fn pallet_id(&self) -> Option<&str> {
        match self {
            Command::Reroute { pallet_id, .. } | Command::Dispose { pallet_id, .. } => {
                Some(pallet_id)
            }
            Command::WarehouseStatus { .. } => None,
        }
    }
}

/// Human-readable reroute reason, e.g. `"Temperature breach: 9.1°C"`.
pub fn breach_reason(temperature: f64) -> String {
    format!("Temperature breach: {temperature}°C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    #[test]
    fn warehouse_status_parses_operational_payload() {
        let raw = r#"{"type":"warehouse_status","warehouse":"warehouse_paris","status":false}"#;
        let cmd: Command = serde_json::from_str(raw).unwrap();
        assert_matches!(
            cmd,
            Command::WarehouseStatus { ref warehouse, status: false, timestamp: None }
                if warehouse == "warehouse_paris"
        );
        assert_eq!(cmd.pallet_id(), None);
    }

    #[test]
    fn reroute_wire_shape() {
        let cmd = Command::Reroute {
            pallet_id: "PALLET_001".to_string(),
            warehouse: "warehouse_berlin".to_string(),
            new_location: Location::new(52.52, 13.405),
            original_location: Some(Location::new(52.5, 12.0)),
            temperature: Some(9.1),
            reason: breach_reason(9.1),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "reroute");
        assert_eq!(json["warehouse"], "warehouse_berlin");
        assert_eq!(json["new_location"]["lon"], 13.405);
        assert_eq!(json["reason"], "Temperature breach: 9.1°C");
        assert_eq!(cmd.pallet_id(), Some("PALLET_001"));
    }

    #[test]
    fn dispose_wire_shape() {
        let cmd = Command::Dispose {
            pallet_id: "PALLET_001".to_string(),
            reason: DISPOSE_REASON.to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "dispose");
        assert_eq!(json["reason"], "Goods spoiled");
        assert_eq!(cmd.kind(), COMMAND_DISPOSE);
    }

    #[test]
    fn unknown_command_type_is_rejected() {
        let raw = r#"{"type":"teleport","pallet_id":"P"}"#;
        assert!(serde_json::from_str::<Command>(raw).is_err());
    }

    #[test]
    fn non_boolean_status_is_rejected() {
        let raw = r#"{"type":"warehouse_status","warehouse":"w","status":"yes"}"#;
        assert!(serde_json::from_str::<Command>(raw).is_err());
    }
}
