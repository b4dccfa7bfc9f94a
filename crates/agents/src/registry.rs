//! Warehouse registry owned by the logistics agent.

use std::path::Path;

use indexmap::IndexMap;

use coldchain_core::error::CoreError;
use coldchain_core::geo::Location;
use coldchain_core::warehouse::{default_warehouses, Warehouse};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read warehouse file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid warehouse file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate warehouse name: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// Warehouses keyed by name, in insertion order.
///
/// Insertion order is the tie-break for [`find_nearest`](Self::find_nearest),
/// so it is preserved exactly as loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseRegistry {
    warehouses: IndexMap<String, Warehouse>,
}

impl WarehouseRegistry {
    pub fn new(warehouses: impl IntoIterator<Item = Warehouse>) -> Result<Self, RegistryError> {
        let mut map = IndexMap::new();
        for warehouse in warehouses {
            warehouse.location.validate()?;
            if map.contains_key(&warehouse.name) {
                return Err(RegistryError::Duplicate(warehouse.name));
            }
            map.insert(warehouse.name.clone(), warehouse);
        }
        Ok(Self { warehouses: map })
    }

    /// Parse a JSON array of warehouses.
    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let warehouses: Vec<Warehouse> = serde_json::from_str(raw)?;
        Self::new(warehouses)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Nearest warehouse that is available and has capacity left.
    ///
    /// Distance is planar Euclidean in degrees. On equal distance the
    /// warehouse inserted first wins.
    pub fn find_nearest(&self, location: &Location) -> Option<&Warehouse> {
        let mut nearest: Option<(&Warehouse, f64)> = None;
        for warehouse in self.warehouses.values().filter(|w| w.accepts_pallets()) {
            let distance = location.distance_to(&warehouse.location);
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((warehouse, distance)),
            }
        }
        nearest.map(|(warehouse, _)| warehouse)
    }

    /// Overwrite a warehouse's availability. Returns `false` for unknown
    /// names, which are left untouched.
    pub fn set_available(&mut self, name: &str, available: bool) -> bool {
        match self.warehouses.get_mut(name) {
            Some(warehouse) => {
                warehouse.available = available;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Warehouse> {
        self.warehouses.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warehouse> {
        self.warehouses.values()
    }

    pub fn len(&self) -> usize {
        self.warehouses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }
}

impl Default for WarehouseRegistry {
    fn default() -> Self {
        Self {
            warehouses: default_warehouses()
                .into_iter()
                .map(|w| (w.name.clone(), w))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn registry(entries: &[(&str, f64, f64, u32, bool)]) -> WarehouseRegistry {
        WarehouseRegistry::new(entries.iter().map(|&(name, lat, lon, capacity, available)| {
            let mut w = Warehouse::new(name, Location::new(lat, lon), capacity);
            w.available = available;
            w
        }))
        .unwrap()
    }

    #[test]
    fn nearest_available_wins() {
        let reg = registry(&[("a", 1.0, 0.0, 10, true), ("b", 0.5, 0.0, 10, true)]);
        let nearest = reg.find_nearest(&Location::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.name, "b");
    }

    #[test]
    fn unavailable_and_full_warehouses_are_skipped() {
        let reg = registry(&[
            ("closed", 0.1, 0.0, 10, false),
            ("full", 0.2, 0.0, 0, true),
            ("open", 5.0, 0.0, 10, true),
        ]);
        let nearest = reg.find_nearest(&Location::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.name, "open");
    }

    #[test]
    fn none_when_nothing_qualifies() {
        let reg = registry(&[("closed", 0.1, 0.0, 10, false), ("full", 0.2, 0.0, 0, true)]);
        assert!(reg.find_nearest(&Location::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn ties_go_to_insertion_order() {
        let reg = registry(&[
            ("west", 0.0, -1.0, 10, true),
            ("east", 0.0, 1.0, 10, true),
        ]);
        let nearest = reg.find_nearest(&Location::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.name, "west");
    }

    #[test]
    fn default_registry_picks_berlin_near_berlin() {
        let reg = WarehouseRegistry::default();
        assert_eq!(reg.len(), 4);
        let nearest = reg.find_nearest(&Location::new(52.5, 13.0)).unwrap();
        assert_eq!(nearest.name, "warehouse_berlin");
    }

    #[test]
    fn set_available_is_idempotent() {
        let mut once = WarehouseRegistry::default();
        once.set_available("warehouse_paris", false);

        let mut twice = WarehouseRegistry::default();
        twice.set_available("warehouse_paris", false);
        twice.set_available("warehouse_paris", false);

        assert_eq!(once, twice);
        assert!(!twice.get("warehouse_paris").unwrap().available);
    }

    #[test]
    fn unknown_name_is_left_alone() {
        let mut reg = WarehouseRegistry::default();
        let before = reg.clone();
        assert!(!reg.set_available("warehouse_atlantis", false));
        assert_eq!(reg, before);
    }

    #[test]
    fn loads_from_json_in_file_order() {
        let raw = r#"[
            {"name": "north", "location": {"lat": 60.0, "lon": 10.0}, "capacity": 5},
            {"name": "south", "location": {"lat": 40.0, "lon": 10.0}, "capacity": 0, "available": false}
        ]"#;
        let reg = WarehouseRegistry::from_json(raw).unwrap();
        let names: Vec<_> = reg.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["north", "south"]);
        assert!(reg.get("north").unwrap().available);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let raw = r#"[
            {"name": "x", "location": {"lat": 1.0, "lon": 1.0}, "capacity": 5},
            {"name": "x", "location": {"lat": 2.0, "lon": 2.0}, "capacity": 5}
        ]"#;
        assert_matches!(WarehouseRegistry::from_json(raw), Err(RegistryError::Duplicate(ref n)) if n == "x");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert_matches!(
            WarehouseRegistry::from_file("/nonexistent/warehouses.json"),
            Err(RegistryError::Io(_))
        );
    }
}
