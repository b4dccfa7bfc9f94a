//! Pallet state owned by the simulator.

use serde::Serialize;

use coldchain_core::geo::{interpolate, Location};
use coldchain_core::telemetry::PalletStatus;
use coldchain_core::types::PalletId;

/// Number of waypoints in every computed route (both endpoints included).
pub const ROUTE_STEPS: usize = 100;

/// Default target temperature of the load, °C.
pub const DEFAULT_IDEAL_TEMP: f64 = 4.0;

/// Default temperature above which the goods spoil, °C.
pub const DEFAULT_MAX_TEMP: f64 = 8.0;

/// Default ambient temperature outside the container, °C.
pub const DEFAULT_EXTERNAL_TEMP: f64 = 25.0;

/// Default cooling unit efficiency while moving (0..=1).
pub const DEFAULT_COOLING_EFFICIENCY: f64 = 0.97;

/// Static parameters used to create a pallet.
#[derive(Debug, Clone, PartialEq)]
pub struct PalletConfig {
    pub pallet_id: PalletId,
    pub origin: Location,
    pub destination: Location,
    pub ideal_temp: f64,
    pub max_temp: f64,
    pub external_temp: f64,
    pub cooling_efficiency: f64,
}

impl PalletConfig {
    pub fn new(pallet_id: impl Into<PalletId>, origin: Location, destination: Location) -> Self {
        Self {
            pallet_id: pallet_id.into(),
            origin,
            destination,
            ideal_temp: DEFAULT_IDEAL_TEMP,
            max_temp: DEFAULT_MAX_TEMP,
            external_temp: DEFAULT_EXTERNAL_TEMP,
            cooling_efficiency: DEFAULT_COOLING_EFFICIENCY,
        }
    }

    pub fn with_temperatures(mut self, ideal_temp: f64, max_temp: f64) -> Self {
        self.ideal_temp = ideal_temp;
        self.max_temp = max_temp;
        self
    }

    pub fn with_external_temp(mut self, external_temp: f64) -> Self {
        self.external_temp = external_temp;
        self
    }
}

/// Full dynamic state of one simulated pallet.
///
/// While `is_moving`, `route_index` only ever grows; it is reset to zero
/// only when a reroute replaces the route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PalletState {
    pub pallet_id: PalletId,
    pub current_location: Location,
    pub destination: Location,
    pub ideal_temp: f64,
    pub max_temp: f64,
    pub current_temp: f64,
    pub status: PalletStatus,
    pub route: Vec<Location>,
    pub route_index: usize,
    pub external_temp: f64,
    pub cooling_efficiency: f64,
    pub is_moving: bool,
}

impl PalletState {
    /// A fresh pallet at `origin`, at its ideal temperature, in transit.
    pub fn new(config: PalletConfig) -> Self {
        Self {
            route: build_route(config.origin, config.destination),
            pallet_id: config.pallet_id,
            current_location: config.origin,
            destination: config.destination,
            ideal_temp: config.ideal_temp,
            max_temp: config.max_temp,
            current_temp: config.ideal_temp,
            status: PalletStatus::InTransit,
            route_index: 0,
            external_temp: config.external_temp,
            cooling_efficiency: config.cooling_efficiency,
            is_moving: true,
        }
    }

    /// Index of the last waypoint.
    pub fn final_index(&self) -> usize {
        self.route.len().saturating_sub(1)
    }

    pub fn at_final_waypoint(&self) -> bool {
        self.route_index >= self.final_index()
    }
}

/// Straight-line route of [`ROUTE_STEPS`] waypoints.
pub fn build_route(origin: Location, destination: Location) -> Vec<Location> {
    interpolate(origin, destination, ROUTE_STEPS)
}
