use axum::extract::State;
use axum::{routing::get, Json, Router};

use coldchain_ledger::LedgerRecord;

use crate::response::DataResponse;
use crate::state::AppState;

/// Locally known ledger records, oldest first. Empty for remote backends.
async fn chain(State(state): State<AppState>) -> Json<DataResponse<Vec<LedgerRecord>>> {
    Json(DataResponse {
        data: state.ledger.chain().await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ledger", get(chain))
}
