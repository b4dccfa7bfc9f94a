//! Thermal and route simulation of a refrigerated pallet.
//!
//! - [`thermal::advance`] is the pure per-tick step: movement, temperature
//!   drift and status transitions, driven by an injected [`NoiseSource`].
//! - [`PalletSimulator`] owns one pallet's state and exposes the mutation
//!   points other components may use (scenario conditions, reroute,
//!   disposal).
//! - [`SimulationRunner`] is the tick loop that publishes telemetry on the
//!   bus and applies incoming commands.

pub mod error;
pub mod noise;
pub mod runner;
pub mod scenario;
pub mod simulator;
pub mod state;
pub mod thermal;

pub use error::SimulationError;
pub use noise::{FixedNoise, NoiseSource, RandomNoise};
pub use runner::{RunSummary, SimulationRunner};
pub use scenario::{Conditions, DefaultScenario, Scenario, SteadyScenario};
pub use simulator::PalletSimulator;
pub use state::{PalletConfig, PalletState};
