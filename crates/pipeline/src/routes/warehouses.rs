//! Operational control of warehouse availability.
//!
//! The logistics agent owns the registry, so this endpoint only publishes a
//! `warehouse_status` command and returns `202 Accepted`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use coldchain_core::command::Command;
use coldchain_core::error::CoreError;
use coldchain_core::topics::TOPIC_LOGISTICS_COMMANDS;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

async fn set_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<AvailabilityRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Command>>)> {
    let warehouse = name.trim();
    if warehouse.is_empty() {
        return Err(CoreError::Validation("warehouse name must not be blank".to_string()).into());
    }

    let command = Command::WarehouseStatus {
        warehouse: warehouse.to_string(),
        status: body.available,
        timestamp: Some(Utc::now()),
    };
    state
        .bus
        .publish_json(TOPIC_LOGISTICS_COMMANDS, &command)
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    tracing::info!(warehouse, available = body.available, "Warehouse status change requested");
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: command })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/warehouses/{name}/status", post(set_status))
}

