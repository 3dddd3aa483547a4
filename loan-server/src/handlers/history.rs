//! History handler

use axum::{extract::State, Json};
use loan_core::LogEntry;
use serde::Serialize;

use crate::{AppResult, AppState};

#[derive(Serialize)]
pub struct HistoryResponse {
    /// `null` until the first prediction is logged
    records: Option<Vec<LogEntry>>,
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<HistoryResponse>> {
    let service = state.service.clone();
    let records = tokio::task::spawn_blocking(move || service.history()).await??;
    Ok(Json(HistoryResponse { records }))
}
