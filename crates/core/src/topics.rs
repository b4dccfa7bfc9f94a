//! Well-known bus topic names.
//!
//! These are wire contracts shared with every producer and consumer on the
//! event bus, including external collaborators (fleet control, dashboard).

/// Telemetry packets emitted by the simulator once per tick.
pub const TOPIC_SENSOR_DATA: &str = "sensor_data";

/// Breach alerts from the monitoring agent, plus `reroute_failed` alerts
/// from the logistics agent.
pub const TOPIC_ALERTS: &str = "alerts";

/// Reroute / dispose commands addressed to pallets.
pub const TOPIC_COMMANDS: &str = "commands";

/// Administrative commands for the logistics agent (warehouse availability).
pub const TOPIC_LOGISTICS_COMMANDS: &str = "logistics_commands";

/// Ledger feedback notifications emitted after a breach is recorded.
pub const TOPIC_LEDGER_FEEDBACK: &str = "ledger_feedback";
