use std::sync::Arc;

use coldchain_events::EventBus;
use coldchain_ledger::{BreachLedger, PalletStateStore};

use crate::tracker::PipelineStats;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Bus the operational endpoints publish on.
    pub bus: Arc<EventBus>,
    /// Keyed pallet view maintained by the tracker.
    pub store: Arc<PalletStateStore>,
    pub stats: Arc<PipelineStats>,
    pub ledger: Arc<dyn BreachLedger>,
}
