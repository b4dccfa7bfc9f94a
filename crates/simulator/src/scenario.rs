//! Scripted operating conditions.
//!
//! A [`Scenario`] is consulted before every tick and may override the
//! cooling efficiency and movement of the pallet, e.g. to model a traffic
//! jam where the truck stands still and the cooler struggles.

/// Conditions to apply before a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub cooling_efficiency: f64,
    pub is_moving: bool,
}

pub trait Scenario: Send {
    /// Conditions for tick number `step` (zero-based), or `None` to leave
    /// the pallet untouched.
    fn conditions(&self, step: u64) -> Option<Conditions>;
}

/// Normal operation with a traffic jam between two steps.
///
/// Steps `[jam_start, jam_end)` stop the truck and degrade the cooler;
/// every other step runs the cooler at `normal_efficiency` while moving.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultScenario {
    pub jam_start: u64,
    pub jam_end: u64,
    pub normal_efficiency: f64,
    pub jam_efficiency: f64,
}

impl Default for DefaultScenario {
    fn default() -> Self {
        Self {
            jam_start: 30,
            jam_end: 60,
            normal_efficiency: 0.97,
            jam_efficiency: 0.85,
        }
    }
}

impl Scenario for DefaultScenario {
    fn conditions(&self, step: u64) -> Option<Conditions> {
        let in_jam = (self.jam_start..self.jam_end).contains(&step);
        Some(if in_jam {
            Conditions {
                cooling_efficiency: self.jam_efficiency,
                is_moving: false,
            }
        } else {
            Conditions {
                cooling_efficiency: self.normal_efficiency,
                is_moving: true,
            }
        })
    }
}

/// Never overrides anything; the pallet runs on its own state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteadyScenario;

impl Scenario for SteadyScenario {
    fn conditions(&self, _step: u64) -> Option<Conditions> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_phases() {
        let scenario = DefaultScenario::default();

        let normal = scenario.conditions(0).unwrap();
        assert!(normal.is_moving);
        assert_eq!(normal.cooling_efficiency, 0.97);

        let last_normal = scenario.conditions(29).unwrap();
        assert!(last_normal.is_moving);

        for step in [30, 45, 59] {
            let jam = scenario.conditions(step).unwrap();
            assert!(!jam.is_moving, "step {step} should be jammed");
            assert_eq!(jam.cooling_efficiency, 0.85);
        }

        let recovered = scenario.conditions(60).unwrap();
        assert!(recovered.is_moving);
        assert_eq!(recovered.cooling_efficiency, 0.97);
    }

    #[test]
    fn steady_scenario_never_overrides() {
        assert!(SteadyScenario.conditions(0).is_none());
        assert!(SteadyScenario.conditions(45).is_none());
    }
}
