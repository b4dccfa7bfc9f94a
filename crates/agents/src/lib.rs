//! Reactive agents of the cold-chain pipeline.
//!
//! - [`MonitoringAgent`] turns telemetry into alerts.
//! - [`LogisticsAgent`] turns alerts into reroute/dispose commands, records
//!   breaches in the ledger and owns the [`WarehouseRegistry`].
//!
//! Both implement [`MessageHandler`](coldchain_events::MessageHandler) and
//! are driven by [`run_consumer`](coldchain_events::run_consumer).

pub mod logistics;
pub mod monitoring;
pub mod registry;

pub use logistics::{BreachHandling, LogisticsAgent};
pub use monitoring::MonitoringAgent;
pub use registry::{RegistryError, WarehouseRegistry};
