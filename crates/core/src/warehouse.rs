//! Warehouse model and the default network the logistics agent starts with.

use serde::{Deserialize, Serialize};

use crate::geo::Location;

/// A storage site that can take in rerouted pallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    /// Unique registry key, e.g. `"warehouse_paris"`.
    pub name: String,
    pub location: Location,
    /// Remaining pallet slots. Zero means the site cannot take new pallets.
    pub capacity: u32,
    #[serde(default = "available_by_default")]
    pub available: bool,
}

fn available_by_default() -> bool {
    true
}

impl Warehouse {
    pub fn new(name: impl Into<String>, location: Location, capacity: u32) -> Self {
        Self {
            name: name.into(),
            location,
            capacity,
            available: true,
        }
    }

    /// Whether this warehouse can be chosen as a reroute target.
    pub fn accepts_pallets(&self) -> bool {
        self.available && self.capacity > 0
    }
}

/// The built-in warehouse network, in registry order.
pub fn default_warehouses() -> Vec<Warehouse> {
    vec![
        Warehouse::new("warehouse_amsterdam", Location::new(52.3676, 4.9041), 100),
        Warehouse::new("warehouse_berlin", Location::new(52.5200, 13.4050), 80),
        Warehouse::new("warehouse_paris", Location::new(48.8566, 2.3522), 120),
        Warehouse::new("warehouse_brussels", Location::new(50.8503, 4.3517), 60),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_or_unavailable_rejects_pallets() {
        let mut w = Warehouse::new("w", Location::new(0.0, 0.0), 0);
        assert!(!w.accepts_pallets());

        w.capacity = 5;
        assert!(w.accepts_pallets());

        w.available = false;
        assert!(!w.accepts_pallets());
    }

    #[test]
    fn default_network_is_available_with_unique_names() {
        let warehouses = default_warehouses();
        assert_eq!(warehouses.len(), 4);
        assert!(warehouses.iter().all(Warehouse::accepts_pallets));

        let mut names: Vec<_> = warehouses.iter().map(|w| w.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn missing_available_flag_defaults_to_available() {
        let raw = r#"{"name":"w","location":{"lat":1.0,"lon":2.0},"capacity":3}"#;
        let w: Warehouse = serde_json::from_str(raw).unwrap();
        assert!(w.available);
    }
}
