//! Liveness and readiness report.
//!
//! Reports `degraded` with `503` once the event bus has been closed, since
//! nothing moves through the pipeline after that.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub bus_open: bool,
    pub ledger_backend: &'static str,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let bus_open = !state.bus.is_closed();
    let (code, status) = if bus_open {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let report = HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION"),
        bus_open,
        ledger_backend: state.ledger.backend_name(),
    };
    (code, Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
