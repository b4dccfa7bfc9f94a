//! Keeps the pallet state store and pipeline counters current.
//!
//! The tracker listens on every pipeline topic and folds what it sees into
//! `pallet:<id>` entries of the [`PalletStateStore`], plus a handful of
//! counters reported by the status API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use coldchain_core::alert::Alert;
use coldchain_core::command::Command;
use coldchain_core::feedback::LedgerFeedback;
use coldchain_core::telemetry::TelemetryPacket;
use coldchain_core::topics::{TOPIC_ALERTS, TOPIC_COMMANDS, TOPIC_LEDGER_FEEDBACK, TOPIC_SENSOR_DATA};
use coldchain_events::{BusMessage, MessageHandler};
use coldchain_ledger::PalletStateStore;

/// Topics the tracker consumes.
pub const TRACKER_TOPICS: [&str; 4] = [
    TOPIC_SENSOR_DATA,
    TOPIC_ALERTS,
    TOPIC_COMMANDS,
    TOPIC_LEDGER_FEEDBACK,
];

/// Running totals since startup.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub packets: AtomicU64,
    pub temperature_alerts: AtomicU64,
    pub spoilage_events: AtomicU64,
    pub reroute_failures: AtomicU64,
    pub reroutes: AtomicU64,
    pub disposals: AtomicU64,
    pub ledger_records: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub packets: u64,
    pub temperature_alerts: u64,
    pub spoilage_events: u64,
    pub reroute_failures: u64,
    pub reroutes: u64,
    pub disposals: u64,
    pub ledger_records: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets: self.packets.load(Ordering::Relaxed),
            temperature_alerts: self.temperature_alerts.load(Ordering::Relaxed),
            spoilage_events: self.spoilage_events.load(Ordering::Relaxed),
            reroute_failures: self.reroute_failures.load(Ordering::Relaxed),
            reroutes: self.reroutes.load(Ordering::Relaxed),
            disposals: self.disposals.load(Ordering::Relaxed),
            ledger_records: self.ledger_records.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub struct StateTracker {
    store: Arc<PalletStateStore>,
    stats: Arc<PipelineStats>,
}

impl StateTracker {
    pub fn new(store: Arc<PalletStateStore>, stats: Arc<PipelineStats>) -> Self {
        Self { store, stats }
    }

    pub fn record_telemetry(&self, packet: &TelemetryPacket) {
        bump(&self.stats.packets);
        self.store.update_pallet(
            &packet.pallet_id,
            [
                ("pallet_id", packet.pallet_id.clone()),
                ("status", packet.status.to_string()),
                ("temperature", packet.temperature.to_string()),
                ("lat", packet.location.lat.to_string()),
                ("lon", packet.location.lon.to_string()),
                ("timestamp", packet.timestamp.to_rfc3339()),
            ],
        );
    }

    pub fn record_alert(&self, alert: &Alert) {
        match alert {
            Alert::TemperatureBreach { temperature, .. } => {
                bump(&self.stats.temperature_alerts);
                self.store.update_pallet(
                    alert.pallet_id(),
                    [
                        ("last_alert", alert.kind().to_string()),
                        ("breach_temperature", temperature.to_string()),
                    ],
                );
            }
            Alert::Spoilage { .. } => {
                bump(&self.stats.spoilage_events);
                self.store
                    .update_pallet(alert.pallet_id(), [("last_alert", alert.kind())]);
            }
            Alert::RerouteFailed { reason, .. } => {
                bump(&self.stats.reroute_failures);
                self.store.update_pallet(
                    alert.pallet_id(),
                    [
                        ("last_alert", alert.kind().to_string()),
                        ("reroute_status", format!("failed: {reason}")),
                    ],
                );
            }
        }
    }

    pub fn record_command(&self, command: &Command) {
        match command {
            Command::Reroute {
                pallet_id,
                warehouse,
                new_location,
                ..
            } => {
                bump(&self.stats.reroutes);
                self.store.update_pallet(
                    pallet_id,
                    [
                        ("reroute_status", "rerouted".to_string()),
                        ("reroute_warehouse", warehouse.clone()),
                        ("destination_lat", new_location.lat.to_string()),
                        ("destination_lon", new_location.lon.to_string()),
                    ],
                );
            }
            Command::Dispose {
                pallet_id, reason, ..
            } => {
                bump(&self.stats.disposals);
                self.store
                    .update_pallet(pallet_id, [("disposal_reason", reason.as_str())]);
            }
            Command::WarehouseStatus { .. } => {}
        }
    }

    pub fn record_feedback(&self, feedback: &LedgerFeedback) {
        let LedgerFeedback::BreachRecorded {
            pallet_id, tx_hash, ..
        } = feedback;
        bump(&self.stats.ledger_records);
        self.store
            .update_pallet(pallet_id, [("last_tx_hash", tx_hash.as_str())]);
    }
}

#[async_trait]
impl MessageHandler for StateTracker {
    async fn handle(&mut self, message: BusMessage) {
        let outcome = match message.topic.as_str() {
            TOPIC_SENSOR_DATA => message
                .decode::<TelemetryPacket>()
                .map(|p| self.record_telemetry(&p)),
            TOPIC_ALERTS => message.decode::<Alert>().map(|a| self.record_alert(&a)),
            TOPIC_COMMANDS => message.decode::<Command>().map(|c| self.record_command(&c)),
            TOPIC_LEDGER_FEEDBACK => message
                .decode::<LedgerFeedback>()
                .map(|f| self.record_feedback(&f)),
            other => {
                tracing::debug!(topic = other, "Tracker ignoring topic");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            tracing::warn!(error = %e, "Tracker dropped malformed message");
        }
    }
}
