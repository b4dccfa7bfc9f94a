pub mod health;
pub mod ledger;
pub mod pallets;
pub mod status;
pub mod warehouses;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /status                        pipeline counters
/// /pallets                       every tracked pallet
/// /pallets/{id}                  one pallet
/// /ledger                        recorded breaches
/// /warehouses/{name}/status      POST availability change
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(status::router())
        .merge(pallets::router())
        .merge(ledger::router())
        .merge(warehouses::router())
}
