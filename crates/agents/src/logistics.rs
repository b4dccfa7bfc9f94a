//! Warehouse selection, rerouting and disposal.
//!
//! The logistics agent is the only owner of the [`WarehouseRegistry`]. It
//! reacts to alerts by issuing commands and recording breaches, and to
//! `warehouse_status` commands by updating the registry. Rerouting and
//! ledger recording are independent: a ledger failure never withholds or
//! reverts a reroute that was already published.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use coldchain_core::alert::Alert;
use coldchain_core::command::{breach_reason, Command, DISPOSE_REASON};
use coldchain_core::geo::Location;
use coldchain_core::topics::{TOPIC_ALERTS, TOPIC_COMMANDS, TOPIC_LOGISTICS_COMMANDS};
use coldchain_core::warehouse::Warehouse;
use coldchain_events::{BusMessage, EventBus, MessageHandler};
use coldchain_ledger::BreachLedger;

use crate::registry::WarehouseRegistry;

/// Topics the logistics agent consumes.
pub const LOGISTICS_TOPICS: [&str; 2] = [TOPIC_ALERTS, TOPIC_LOGISTICS_COMMANDS];

/// Reason carried by `reroute_failed` alerts.
pub const NO_WAREHOUSE_REASON: &str = "No available warehouses";

/// What a temperature alert led to.
#[derive(Debug, Clone, PartialEq)]
pub enum BreachHandling {
    /// A reroute was published. `tx_hash` is `None` when the ledger failed.
    Rerouted {
        warehouse: String,
        tx_hash: Option<String>,
    },
    /// No warehouse qualified; a `reroute_failed` alert was published.
    RerouteFailed,
    /// The alert did not pass validation; nothing was published.
    Rejected,
}

pub struct LogisticsAgent {
    bus: Arc<EventBus>,
    registry: WarehouseRegistry,
    ledger: Arc<dyn BreachLedger>,
}

impl LogisticsAgent {
    pub fn new(bus: Arc<EventBus>, registry: WarehouseRegistry, ledger: Arc<dyn BreachLedger>) -> Self {
        tracing::info!(
            warehouses = registry.len(),
            ledger = ledger.backend_name(),
            "Logistics agent initialized"
        );
        Self {
            bus,
            registry,
            ledger,
        }
    }

    pub fn registry(&self) -> &WarehouseRegistry {
        &self.registry
    }

    pub fn find_nearest_warehouse(&self, location: &Location) -> Option<&Warehouse> {
        let nearest = self.registry.find_nearest(location);
        match nearest {
            Some(w) => tracing::info!(
                warehouse = %w.name,
                lat = w.location.lat,
                lon = w.location.lon,
                "Nearest warehouse"
            ),
            None => tracing::warn!("No available warehouses found"),
        }
        nearest
    }

    /// Reroute a breaching pallet to the nearest warehouse and record the
    /// breach.
    pub async fn handle_temperature_alert(&self, alert: &Alert) -> BreachHandling {
        let Alert::TemperatureBreach {
            pallet_id,
            temperature,
            location,
            ..
        } = alert
        else {
            tracing::warn!(alert = alert.kind(), "Not a temperature breach alert");
            return BreachHandling::Rejected;
        };

        if pallet_id.trim().is_empty() {
            tracing::warn!("Temperature alert without pallet_id, ignoring");
            return BreachHandling::Rejected;
        }
        if let Err(e) = location.validate() {
            tracing::warn!(pallet_id = %pallet_id, error = %e, "Temperature alert with invalid location, ignoring");
            return BreachHandling::Rejected;
        }

        tracing::warn!(
            pallet_id = %pallet_id,
            temperature,
            lat = location.lat,
            lon = location.lon,
            "Handling temperature alert"
        );

        let Some(warehouse) = self.find_nearest_warehouse(location).cloned() else {
            tracing::error!(pallet_id = %pallet_id, "Could not find available warehouse");
            self.publish(
                TOPIC_ALERTS,
                &Alert::RerouteFailed {
                    pallet_id: pallet_id.clone(),
                    reason: NO_WAREHOUSE_REASON.to_string(),
                    timestamp: Utc::now(),
                    original_alert: Box::new(alert.clone()),
                },
            );
            return BreachHandling::RerouteFailed;
        };

        self.publish(
            TOPIC_COMMANDS,
            &Command::Reroute {
                pallet_id: pallet_id.clone(),
                warehouse: warehouse.name.clone(),
                new_location: warehouse.location,
                original_location: Some(*location),
                temperature: Some(*temperature),
                reason: breach_reason(*temperature),
                timestamp: Utc::now(),
            },
        );
        tracing::info!(pallet_id = %pallet_id, warehouse = %warehouse.name, "Issued reroute command");

        let tx_hash = match self
            .ledger
            .record_temperature_breach(pallet_id, *temperature, location)
            .await
        {
            Ok(tx_hash) => {
                tracing::info!(pallet_id = %pallet_id, tx_hash = %tx_hash, "Breach recorded in ledger");
                Some(tx_hash)
            }
            Err(e) => {
                tracing::warn!(pallet_id = %pallet_id, error = %e, "Failed to record breach in ledger");
                None
            }
        };

        BreachHandling::Rerouted {
            warehouse: warehouse.name,
            tx_hash,
        }
    }

    /// Order disposal of a spoiled pallet. Always publishes exactly one
    /// `dispose` command.
    pub fn handle_spoilage_alert(&self, pallet_id: &str, location: &Location) {
        tracing::error!(
            pallet_id,
            lat = location.lat,
            lon = location.lon,
            "Handling spoilage alert"
        );
        self.publish(
            TOPIC_COMMANDS,
            &Command::Dispose {
                pallet_id: pallet_id.to_string(),
                reason: DISPOSE_REASON.to_string(),
                timestamp: Utc::now(),
            },
        );
        tracing::info!(pallet_id, "Issued disposal command");
    }

    /// Overwrite a warehouse's availability. Unknown names are logged and
    /// ignored; repeating an update is harmless.
    pub fn handle_warehouse_status(&mut self, warehouse: &str, available: bool) {
        if self.registry.set_available(warehouse, available) {
            let status = if available { "available" } else { "unavailable" };
            tracing::info!(warehouse, status, "Updated warehouse status");
        } else {
            tracing::warn!(warehouse, "Unknown warehouse");
        }
    }

    async fn handle_alert(&self, alert: Alert) {
        match &alert {
            Alert::TemperatureBreach { .. } => {
                self.handle_temperature_alert(&alert).await;
            }
            Alert::Spoilage {
                pallet_id,
                location,
                ..
            } => self.handle_spoilage_alert(pallet_id, location),
            Alert::RerouteFailed {
                pallet_id, reason, ..
            } => {
                tracing::debug!(pallet_id = %pallet_id, reason = %reason, "Reroute failure acknowledged");
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::WarehouseStatus {
                warehouse, status, ..
            } => self.handle_warehouse_status(&warehouse, status),
            other => {
                tracing::warn!(command = other.kind(), "Unexpected command on logistics_commands, ignoring")
            }
        }
    }

    fn publish<T: serde::Serialize>(&self, topic: &str, message: &T) {
        if let Err(e) = self.bus.publish_json(topic, message) {
            tracing::error!(topic, error = %e, "Failed to publish");
        }
    }
}

#[async_trait]
impl MessageHandler for LogisticsAgent {
    async fn handle(&mut self, message: BusMessage) {
        match message.topic.as_str() {
            TOPIC_ALERTS => match message.decode::<Alert>() {
                Ok(alert) => self.handle_alert(alert).await,
                Err(e) => tracing::warn!(error = %e, "Dropping malformed alert"),
            },
            TOPIC_LOGISTICS_COMMANDS => match message.decode::<Command>() {
                Ok(command) => self.handle_command(command),
                Err(e) => tracing::warn!(error = %e, "Dropping malformed logistics command"),
            },
            other => tracing::warn!(topic = other, "Message on unexpected topic"),
        }
    }
}
