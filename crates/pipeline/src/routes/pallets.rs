use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};

use coldchain_core::error::CoreError;
use coldchain_ledger::PalletSnapshot;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

async fn list_pallets(State(state): State<AppState>) -> Json<DataResponse<Vec<PalletSnapshot>>> {
    Json(DataResponse {
        data: state.store.list_pallets(),
    })
}

async fn get_pallet(
    State(state): State<AppState>,
    Path(pallet_id): Path<String>,
) -> AppResult<Json<DataResponse<PalletSnapshot>>> {
    let snapshot = state
        .store
        .get_pallet(&pallet_id)
        .ok_or(CoreError::NotFound {
            entity: "Pallet",
            key: pallet_id,
        })?;
    Ok(Json(DataResponse { data: snapshot }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pallets", get(list_pallets))
        .route("/pallets/{id}", get(get_pallet))
}
