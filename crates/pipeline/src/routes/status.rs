//! Pipeline summary for the dashboard.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use coldchain_core::telemetry::PalletStatus;
use coldchain_core::types::Timestamp;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub timestamp: Timestamp,
    /// Tracked pallets whose last reported status is not final.
    pub active_shipments: usize,
    pub temperature_alerts: u64,
    pub spoilage_events: u64,
    pub reroutes: u64,
    pub disposals: u64,
    pub reroute_failures: u64,
    pub ledger_records: u64,
    pub ledger_backend: &'static str,
    pub system_status: &'static str,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let active_shipments = state
        .store
        .list_pallets()
        .iter()
        .filter(|snapshot| {
            snapshot
                .get("status")
                .and_then(|s| s.parse::<PalletStatus>().ok())
                .is_some_and(|s| !s.is_final())
        })
        .count();
    let counts = state.stats.snapshot();

    Json(StatusResponse {
        timestamp: Utc::now(),
        active_shipments,
        temperature_alerts: counts.temperature_alerts,
        spoilage_events: counts.spoilage_events,
        reroutes: counts.reroutes,
        disposals: counts.disposals,
        reroute_failures: counts.reroute_failures,
        ledger_records: counts.ledger_records,
        ledger_backend: state.ledger.backend_name(),
        system_status: "operational",
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(status))
}
