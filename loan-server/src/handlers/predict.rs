//! Single prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use loan_core::{LoanApplication, SinglePrediction};

use crate::{AppError, AppResult, AppState};

/// Score one JSON application
pub async fn single(
    State(state): State<AppState>,
    payload: Result<Json<LoanApplication>, JsonRejection>,
) -> AppResult<Json<SinglePrediction>> {
    let Json(application) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.predict_one(application)).await??;

    if !result.logged {
        tracing::warn!("Prediction returned without a log entry");
    }
    Ok(Json(result))
}
