//! The per-tick physical model.
//!
//! [`advance`] is a pure function of the previous state and one noise draw:
//! it moves the pallet one waypoint, lets the load drift towards the
//! ambient temperature according to the cooling efficiency, and evaluates
//! the status transitions.

use chrono::Utc;

use coldchain_core::telemetry::{round_reading, PalletStatus, TelemetryPacket};

use crate::noise::NoiseSource;
use crate::state::PalletState;

/// Lower bound of the per-tick drift factor.
pub const DRIFT_FACTOR_LOW: f64 = 0.1;

/// Upper bound of the per-tick drift factor.
pub const DRIFT_FACTOR_HIGH: f64 = 0.3;

/// Cooling efficiency multiplier applied while the pallet is stationary.
pub const STATIONARY_EFFICIENCY_FACTOR: f64 = 0.5;

/// Advance `state` by one tick and return the new state together with the
/// telemetry packet describing it.
pub fn advance(state: &PalletState, noise: &mut dyn NoiseSource) -> (PalletState, TelemetryPacket) {
    let mut next = state.clone();

    if next.status == PalletStatus::AwaitingDisposal {
        next.is_moving = false;
    }

    // Movement
    if next.is_moving && !next.at_final_waypoint() {
        next.route_index += 1;
        next.current_location = next.route[next.route_index];
    } else {
        next.is_moving = false;
    }

    // Temperature
    let influence = temperature_influence(&next);
    next.current_temp += influence * noise.uniform(DRIFT_FACTOR_LOW, DRIFT_FACTOR_HIGH);

    // Status
    next.status = next_status(&next);
    if next.status == PalletStatus::Delivered {
        next.is_moving = false;
    }

    let packet = telemetry(&next);
    (next, packet)
}

/// Unscaled temperature drift for one tick.
///
/// Cooling degrades to half its efficiency while the pallet is stopped.
pub fn temperature_influence(state: &PalletState) -> f64 {
    let efficiency = if state.is_moving {
        state.cooling_efficiency
    } else {
        state.cooling_efficiency * STATIONARY_EFFICIENCY_FACTOR
    };
    (state.external_temp - state.ideal_temp) * (1.0 - efficiency)
}

/// Status after a tick. Spoilage is checked before delivery, so a pallet
/// that overheats on its final step is reported `SPOILED`.
fn next_status(state: &PalletState) -> PalletStatus {
    match state.status {
        PalletStatus::Delivered | PalletStatus::Spoiled | PalletStatus::AwaitingDisposal => {
            state.status
        }
        PalletStatus::InTransit | PalletStatus::InWarehouse => {
            if state.current_temp > state.max_temp {
                PalletStatus::Spoiled
            } else if state.at_final_waypoint() {
                PalletStatus::Delivered
            } else {
                state.status
            }
        }
    }
}

/// Snapshot `state` as a sensor packet.
pub fn telemetry(state: &PalletState) -> TelemetryPacket {
    TelemetryPacket {
        pallet_id: state.pallet_id.clone(),
        timestamp: Utc::now(),
        location: state.current_location,
        temperature: round_reading(state.current_temp),
        status: state.status,
    }
}

#[cfg(test)]
mod tests {
    use coldchain_core::geo::Location;

    use super::*;
    use crate::noise::{FixedNoise, RandomNoise};
    use crate::state::{PalletConfig, ROUTE_STEPS};

    fn pallet() -> PalletState {
        PalletState::new(PalletConfig::new(
            "PALLET_001",
            Location::new(52.52, 13.405),
            Location::new(52.3676, 4.9041),
        ))
    }

    #[test]
    fn moving_tick_advances_one_waypoint() {
        let state = pallet();
        let (next, packet) = advance(&state, &mut FixedNoise(0.2));

        assert_eq!(next.route_index, 1);
        assert_eq!(next.current_location, state.route[1]);
        assert_eq!(packet.location, state.route[1]);
        assert!(next.is_moving);
        assert_eq!(packet.status, PalletStatus::InTransit);
    }

    #[test]
    fn moving_drift_uses_full_efficiency() {
        let state = pallet();
        let (next, _) = advance(&state, &mut FixedNoise(0.2));

        // (25 - 4) * (1 - 0.97) * 0.2
        let expected = 4.0 + 21.0 * 0.03 * 0.2;
        assert!((next.current_temp - expected).abs() < 1e-9);
    }

    #[test]
    fn stationary_drift_uses_half_efficiency() {
        let mut state = pallet();
        state.is_moving = false;

        let (next, _) = advance(&state, &mut FixedNoise(0.1));

        // (25 - 4) * (1 - 0.485) * 0.1
        let expected = 4.0 + 21.0 * (1.0 - 0.485) * 0.1;
        assert!((next.current_temp - expected).abs() < 1e-9);
        assert_eq!(next.route_index, 0);
        assert!(!next.is_moving);
    }

    #[test]
    fn overheating_spoils_the_pallet() {
        let mut state = pallet();
        state.current_temp = 8.5;

        let (next, packet) = advance(&state, &mut FixedNoise(0.1));

        assert_eq!(next.status, PalletStatus::Spoiled);
        assert_eq!(packet.status, PalletStatus::Spoiled);
    }

    #[test]
    fn spoilage_overrides_delivery_on_final_step() {
        let mut state = pallet();
        state.route_index = ROUTE_STEPS - 2;
        state.current_temp = 9.0;

        let (next, _) = advance(&state, &mut FixedNoise(0.1));

        assert!(next.at_final_waypoint());
        assert_eq!(next.status, PalletStatus::Spoiled);
    }

    #[test]
    fn reaching_final_waypoint_delivers_once_and_stops() {
        let mut state = pallet();
        state.route_index = ROUTE_STEPS - 2;

        let (delivered, packet) = advance(&state, &mut FixedNoise(0.1));
        assert_eq!(delivered.status, PalletStatus::Delivered);
        assert_eq!(packet.status, PalletStatus::Delivered);
        assert!(!delivered.is_moving);
        assert_eq!(delivered.current_location, state.destination_waypoint());

        let (after, _) = advance(&delivered, &mut FixedNoise(0.1));
        assert_eq!(after.status, PalletStatus::Delivered);
        assert!(!after.is_moving);
        assert_eq!(after.route_index, delivered.route_index);
    }

    #[test]
    fn spoiled_is_one_way() {
        let mut state = pallet();
        state.status = PalletStatus::Spoiled;
        state.external_temp = -20.0;
        state.current_temp = 2.0;

        let (next, _) = advance(&state, &mut FixedNoise(0.3));
        assert!(next.current_temp < state.current_temp);
        assert_eq!(next.status, PalletStatus::Spoiled);
    }

    #[test]
    fn awaiting_disposal_is_sticky_and_stationary() {
        let mut state = pallet();
        state.status = PalletStatus::AwaitingDisposal;
        state.current_temp = 12.0;

        let (next, _) = advance(&state, &mut FixedNoise(0.2));
        assert_eq!(next.status, PalletStatus::AwaitingDisposal);
        assert_eq!(next.route_index, 0);
        assert!(!next.is_moving);
    }

    #[test]
    fn packet_temperature_is_rounded() {
        let mut state = pallet();
        state.current_temp = 4.123_456;
        state.is_moving = false;
        state.external_temp = state.ideal_temp;

        let (_, packet) = advance(&state, &mut FixedNoise(0.2));
        assert_eq!(packet.temperature, 4.12);
    }

    #[test]
    fn route_index_never_decreases_while_moving() {
        let mut state = pallet();
        let mut noise = RandomNoise::seeded(3);
        let mut last = state.route_index;

        for _ in 0..150 {
            let (next, _) = advance(&state, &mut noise);
            if state.is_moving {
                assert!(next.route_index >= last);
            }
            last = next.route_index;
            state = next;
        }
        assert!(state.at_final_waypoint());
        assert!(!state.is_moving);
    }

    impl PalletState {
        fn destination_waypoint(&self) -> Location {
            self.route[self.final_index()]
        }
    }
}
