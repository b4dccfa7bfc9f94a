//! Threshold monitoring of pallet telemetry.

use std::sync::Arc;

use async_trait::async_trait;

use coldchain_core::alert::Alert;
use coldchain_core::telemetry::{PalletStatus, TelemetryPacket};
use coldchain_core::topics::{TOPIC_ALERTS, TOPIC_SENSOR_DATA};
use coldchain_events::{BusMessage, EventBus, MessageHandler};

/// Topics the monitoring agent consumes.
pub const MONITORING_TOPICS: [&str; 1] = [TOPIC_SENSOR_DATA];

/// Watches `sensor_data` and raises alerts on `alerts`.
pub struct MonitoringAgent {
    bus: Arc<EventBus>,
    threshold: f64,
}

impl MonitoringAgent {
    pub fn new(bus: Arc<EventBus>, threshold: f64) -> Self {
        tracing::info!(threshold, "Monitoring agent initialized");
        Self { bus, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Alerts raised by one packet. The breach and spoilage checks are
    /// independent, so a packet can raise both.
    pub fn evaluate(&self, packet: &TelemetryPacket) -> Vec<Alert> {
        let mut alerts = Vec::with_capacity(2);

        if packet.temperature > self.threshold {
            alerts.push(Alert::TemperatureBreach {
                pallet_id: packet.pallet_id.clone(),
                temperature: packet.temperature,
                location: packet.location,
                timestamp: packet.timestamp,
            });
        }

        if packet.status == PalletStatus::Spoiled {
            alerts.push(Alert::Spoilage {
                pallet_id: packet.pallet_id.clone(),
                location: packet.location,
                timestamp: packet.timestamp,
            });
        }

        alerts
    }

    /// Evaluate `packet` and publish every resulting alert.
    pub fn process_packet(&self, packet: &TelemetryPacket) {
        tracing::debug!(
            pallet_id = %packet.pallet_id,
            temperature = packet.temperature,
            status = %packet.status,
            "Telemetry received"
        );

        for alert in self.evaluate(packet) {
            match &alert {
                Alert::TemperatureBreach { temperature, .. } => tracing::warn!(
                    pallet_id = %packet.pallet_id,
                    temperature,
                    threshold = self.threshold,
                    "Temperature breach detected"
                ),
                _ => tracing::error!(pallet_id = %packet.pallet_id, "Spoilage detected"),
            }

            if let Err(e) = self.bus.publish_json(TOPIC_ALERTS, &alert) {
                tracing::error!(pallet_id = %packet.pallet_id, error = %e, "Failed to publish alert");
            }
        }
    }
}

#[async_trait]
impl MessageHandler for MonitoringAgent {
    async fn handle(&mut self, message: BusMessage) {
        match message.decode::<TelemetryPacket>() {
            Ok(packet) => self.process_packet(&packet),
            Err(e) => tracing::warn!(error = %e, "Dropping malformed telemetry packet"),
        }
    }
}
