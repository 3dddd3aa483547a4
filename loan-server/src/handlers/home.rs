//! Service info and upload instructions

use axum::{extract::State, Json};
use loan_core::constants::REQUIRED_COLUMNS;
use loan_core::ModelInfo;
use serde::Serialize;

use crate::AppState;

pub const ROUTES: &[&str] = &[
    "GET /",
    "GET /health",
    "POST /predict",
    "GET /batch",
    "POST /predict-batch-ui",
    "POST /predict-batch",
    "GET /history",
];

#[derive(Serialize)]
pub struct ServiceInfo {
    service: &'static str,
    version: &'static str,
    model: ModelInfo,
    routes: &'static [&'static str],
}

#[derive(Serialize)]
pub struct UploadInfo {
    field: &'static str,
    required_columns: &'static [&'static str],
    max_upload_bytes: usize,
}

pub async fn index(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "loan-repayment-predictor",
        version: env!("CARGO_PKG_VERSION"),
        model: state.service.info(),
        routes: ROUTES,
    })
}

/// What a batch upload must look like
pub async fn batch_page(State(state): State<AppState>) -> Json<UploadInfo> {
    Json(UploadInfo {
        field: super::batch::UPLOAD_FIELD,
        required_columns: REQUIRED_COLUMNS,
        max_upload_bytes: state.config.max_upload_bytes,
    })
}
