//! Tick loop driving one [`PalletSimulator`] against the event bus.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use coldchain_core::command::Command;
use coldchain_core::telemetry::PalletStatus;
use coldchain_core::topics::{TOPIC_COMMANDS, TOPIC_SENSOR_DATA};
use coldchain_events::{BusError, EventBus, Subscription};

use crate::scenario::Scenario;
use crate::simulator::PalletSimulator;

/// Default wall-clock time between two ticks.
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of packets published.
    pub steps: u64,
    pub final_status: PalletStatus,
}

pub struct SimulationRunner<S> {
    simulator: PalletSimulator,
    scenario: S,
    bus: Arc<EventBus>,
    step_interval: Duration,
    /// Ticks taken so far, kept across restarts of [`run`](Self::run).
    steps: u64,
}

impl<S: Scenario> SimulationRunner<S> {
    pub fn new(simulator: PalletSimulator, scenario: S, bus: Arc<EventBus>) -> Self {
        Self {
            simulator,
            scenario,
            bus,
            step_interval: DEFAULT_STEP_INTERVAL,
            steps: 0,
        }
    }

    pub fn with_step_interval(mut self, step_interval: Duration) -> Self {
        self.step_interval = step_interval;
        self
    }

    pub fn simulator(&self) -> &PalletSimulator {
        &self.simulator
    }

    /// Run until the pallet is delivered or awaiting disposal, or until
    /// `cancel` fires.
    ///
    /// Each step applies the scenario, drains pending commands for this
    /// pallet, advances one tick and publishes the packet on `sensor_data`.
    /// Fails only if the bus is closed underneath the loop; calling `run`
    /// again resumes the same pallet.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<RunSummary, BusError> {
        let mut commands = self.bus.subscribe(&[TOPIC_COMMANDS])?;

        tracing::info!(
            pallet_id = %self.simulator.pallet_id(),
            interval_ms = self.step_interval.as_millis() as u64,
            "Simulation started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if let Some(conditions) = self.scenario.conditions(self.steps) {
                if let Err(e) = self
                    .simulator
                    .apply_scenario(conditions.cooling_efficiency, conditions.is_moving)
                {
                    tracing::warn!(step = self.steps, error = %e, "Ignoring invalid scenario conditions");
                }
            }

            self.drain_commands(&mut commands)?;

            let packet = self.simulator.tick();
            self.steps += 1;

            if let Err(e) = self.bus.publish_json(TOPIC_SENSOR_DATA, &packet) {
                tracing::error!(pallet_id = %packet.pallet_id, error = %e, "Failed to publish telemetry");
            }
            tracing::debug!(
                pallet_id = %packet.pallet_id,
                temperature = packet.temperature,
                status = %packet.status,
                lat = packet.location.lat,
                lon = packet.location.lon,
                "Telemetry published"
            );

            if matches!(
                packet.status,
                PalletStatus::Delivered | PalletStatus::AwaitingDisposal
            ) {
                tracing::info!(pallet_id = %packet.pallet_id, status = %packet.status, "Simulation finished");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.step_interval) => {}
            }
        }

        commands.close();
        Ok(RunSummary {
            steps: self.steps,
            final_status: self.simulator.status(),
        })
    }

    fn drain_commands(&mut self, commands: &mut Subscription) -> Result<(), BusError> {
        while let Some(message) = commands.try_next()? {
            let command: Command = match message.decode() {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed command");
                    continue;
                }
            };

            if let Err(e) = self.simulator.apply_command(&command) {
                tracing::warn!(
                    pallet_id = %self.simulator.pallet_id(),
                    command = command.kind(),
                    error = %e,
                    "Command rejected"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use coldchain_core::geo::Location;
    use coldchain_core::telemetry::TelemetryPacket;

    use super::*;
    use crate::noise::FixedNoise;
    use crate::scenario::SteadyScenario;
    use crate::state::{PalletConfig, PalletState};

    const FAST: Duration = Duration::from_millis(2);

    /// A pallet whose load never warms up, so only routing decides its fate.
    fn cool_pallet() -> PalletState {
        let config = PalletConfig::new(
            "PALLET_001",
            Location::new(52.52, 13.405),
            Location::new(52.3676, 4.9041),
        )
        .with_external_temp(4.0);
        PalletState::new(config)
    }

    fn runner(state: PalletState, bus: &Arc<EventBus>) -> SimulationRunner<SteadyScenario> {
        let simulator = PalletSimulator::from_state(state, Box::new(FixedNoise(0.2)));
        SimulationRunner::new(simulator, SteadyScenario, Arc::clone(bus)).with_step_interval(FAST)
    }

    async fn wait_for_subscriber(bus: &EventBus, topic: &str) {
        while bus.subscriber_count(topic) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn stops_after_publishing_delivery() {
        let bus = Arc::new(EventBus::default());
        let mut telemetry = bus.subscribe(&[TOPIC_SENSOR_DATA]).unwrap();

        let mut state = cool_pallet();
        state.route_index = state.final_index() - 3;

        let summary = runner(state, &bus)
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.steps, 3);
        assert_eq!(summary.final_status, PalletStatus::Delivered);

        let mut statuses = Vec::new();
        while let Some(msg) = telemetry.try_next().unwrap() {
            let packet: TelemetryPacket = msg.decode().unwrap();
            statuses.push(packet.status);
        }
        assert_eq!(
            statuses,
            vec![
                PalletStatus::InTransit,
                PalletStatus::InTransit,
                PalletStatus::Delivered
            ]
        );
    }

    #[tokio::test]
    async fn dispose_command_ends_the_run() {
        let bus = Arc::new(EventBus::default());
        let mut task = runner(cool_pallet(), &bus);
        let handle = tokio::spawn(async move { task.run(CancellationToken::new()).await });

        wait_for_subscriber(&bus, TOPIC_COMMANDS).await;
        bus.publish_json(
            TOPIC_COMMANDS,
            &Command::Dispose {
                pallet_id: "PALLET_001".to_string(),
                reason: "Goods spoiled".to_string(),
                timestamp: Utc::now(),
            },
        )
        .unwrap();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.final_status, PalletStatus::AwaitingDisposal);
        assert!(summary.steps < 99);
    }

    #[tokio::test]
    async fn commands_for_other_pallets_do_not_stop_the_run() {
        let bus = Arc::new(EventBus::default());
        let mut state = cool_pallet();
        state.route_index = state.final_index() - 20;
        let mut task = runner(state, &bus);
        let handle = tokio::spawn(async move { task.run(CancellationToken::new()).await });

        wait_for_subscriber(&bus, TOPIC_COMMANDS).await;
        bus.publish_json(
            TOPIC_COMMANDS,
            &Command::Dispose {
                pallet_id: "PALLET_999".to_string(),
                reason: "Goods spoiled".to_string(),
                timestamp: Utc::now(),
            },
        )
        .unwrap();
        bus.publish(TOPIC_COMMANDS, "{garbage");

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.final_status, PalletStatus::Delivered);
    }

    #[tokio::test]
    async fn cancellation_stops_an_endless_run() {
        let bus = Arc::new(EventBus::default());
        let mut state = cool_pallet();
        state.is_moving = false;

        struct Parked;
        impl Scenario for Parked {
            fn conditions(&self, _step: u64) -> Option<crate::scenario::Conditions> {
                Some(crate::scenario::Conditions {
                    cooling_efficiency: 0.97,
                    is_moving: false,
                })
            }
        }

        let simulator = PalletSimulator::from_state(state, Box::new(FixedNoise(0.2)));
        let cancel = CancellationToken::new();
        let mut task =
            SimulationRunner::new(simulator, Parked, Arc::clone(&bus)).with_step_interval(FAST);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { task.run(token).await });

        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.final_status, PalletStatus::InTransit);
        assert!(summary.steps > 0);
        assert_eq!(bus.subscriber_count(TOPIC_COMMANDS), 0);
    }

    #[tokio::test]
    async fn closed_bus_is_reported() {
        let bus = Arc::new(EventBus::default());
        bus.close();

        let result = runner(cool_pallet(), &bus).run(CancellationToken::new()).await;
        assert!(matches!(result, Err(BusError::Closed)));
    }
}
