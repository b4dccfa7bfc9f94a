//! A single pallet and the mutation points exposed to other components.

use coldchain_core::command::Command;
use coldchain_core::geo::Location;
use coldchain_core::telemetry::{PalletStatus, TelemetryPacket};
use coldchain_core::validation::validate_unit_range;

use crate::error::SimulationError;
use crate::noise::NoiseSource;
use crate::state::{build_route, PalletConfig, PalletState};
use crate::thermal;

/// Owns one pallet's state and its noise source.
pub struct PalletSimulator {
    state: PalletState,
    noise: Box<dyn NoiseSource>,
}

impl PalletSimulator {
    pub fn new(config: PalletConfig, noise: Box<dyn NoiseSource>) -> Self {
        Self::from_state(PalletState::new(config), noise)
    }

    /// Resume from an existing state (used by tests and restarts).
    pub fn from_state(state: PalletState, noise: Box<dyn NoiseSource>) -> Self {
        Self { state, noise }
    }

    pub fn state(&self) -> &PalletState {
        &self.state
    }

    pub fn pallet_id(&self) -> &str {
        &self.state.pallet_id
    }

    pub fn status(&self) -> PalletStatus {
        self.state.status
    }

    /// Advance one tick and return the emitted packet.
    pub fn tick(&mut self) -> TelemetryPacket {
        let (next, packet) = thermal::advance(&self.state, self.noise.as_mut());
        self.state = next;
        packet
    }

    /// Override cooling efficiency and movement before the next tick.
    pub fn apply_scenario(
        &mut self,
        cooling_efficiency: f64,
        is_moving: bool,
    ) -> Result<(), SimulationError> {
        validate_unit_range(cooling_efficiency, "cooling_efficiency")?;
        self.state.cooling_efficiency = cooling_efficiency;
        self.state.is_moving = is_moving;
        Ok(())
    }

    /// Send the pallet towards a new destination.
    ///
    /// The route is recomputed from the current location and the pallet
    /// starts moving again. A delivered or warehoused pallet goes back in
    /// transit; spoilage is not undone. Pallets awaiting disposal refuse
    /// reroutes.
    pub fn reroute(&mut self, destination: Location) -> Result<(), SimulationError> {
        destination.validate()?;
        if self.state.status == PalletStatus::AwaitingDisposal {
            return Err(SimulationError::AwaitingDisposal(self.state.pallet_id.clone()));
        }

        self.state.destination = destination;
        self.state.route = build_route(self.state.current_location, destination);
        self.state.route_index = 0;
        self.state.is_moving = true;
        if matches!(
            self.state.status,
            PalletStatus::Delivered | PalletStatus::InWarehouse
        ) {
            self.state.status = PalletStatus::InTransit;
        }
        Ok(())
    }

    /// Mark the goods for disposal, regardless of temperature.
    pub fn dispose(&mut self) {
        self.state.status = PalletStatus::AwaitingDisposal;
        self.state.is_moving = false;
    }

    /// Apply a bus command if it is addressed to this pallet.
    ///
    /// Returns `Ok(true)` when the command changed the pallet, `Ok(false)`
    /// when it was for someone else or not a pallet command.
    pub fn apply_command(&mut self, command: &Command) -> Result<bool, SimulationError> {
        if command.pallet_id() != Some(self.pallet_id()) {
            return Ok(false);
        }

        match command {
            Command::Reroute {
                warehouse,
                new_location,
                ..
            } => {
                self.reroute(*new_location)?;
                tracing::info!(
                    pallet_id = %self.state.pallet_id,
                    warehouse = %warehouse,
                    lat = new_location.lat,
                    lon = new_location.lon,
                    "Rerouting pallet"
                );
                Ok(true)
            }
            Command::Dispose { reason, .. } => {
                self.dispose();
                tracing::warn!(
                    pallet_id = %self.state.pallet_id,
                    reason = %reason,
                    "Disposal command received, goods will be disposed"
                );
                Ok(true)
            }
            Command::WarehouseStatus { .. } => Ok(false),
        }
    }
}
