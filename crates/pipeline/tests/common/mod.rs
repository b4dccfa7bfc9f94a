use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use coldchain_events::EventBus;
use coldchain_ledger::{BreachLedger, NotifyingLedger, PalletStateStore, SimulatedLedger};
use coldchain_pipeline::app::build_app;
use coldchain_pipeline::config::DashboardSettings;
use coldchain_pipeline::state::AppState;
use coldchain_pipeline::tracker::PipelineStats;

/// Dashboard settings with a 30-second request timeout.
pub fn test_settings() -> DashboardSettings {
    DashboardSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
    }
}

/// Fresh state: empty store, zero counters, simulated ledger.
pub fn test_state() -> AppState {
    let bus = Arc::new(EventBus::default());
    let ledger: Arc<dyn BreachLedger> = Arc::new(NotifyingLedger::new(
        SimulatedLedger::default(),
        Arc::clone(&bus),
    ));
    AppState {
        bus,
        store: Arc::new(PalletStateStore::new()),
        stats: Arc::new(PipelineStats::default()),
        ledger,
    }
}

/// Full router with the production middleware stack.
pub fn build_test_app(state: AppState) -> Router {
    build_app(state, &test_settings())
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
