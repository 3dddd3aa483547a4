//! Batch upload handler

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use loan_core::{read_batch, BatchPrediction, PipelineError, PipelineResult};

use crate::uploads;
use crate::{AppResult, AppState};

/// Multipart field carrying the CSV file
pub const UPLOAD_FIELD: &str = "file";

/// Stage an uploaded CSV, then score every row
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<BatchPrediction>> {
    let mut multipart = multipart.map_err(|_| PipelineError::NO_FILE)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_string();
            upload = Some((filename, field.bytes().await?));
            break;
        }
    }

    let (filename, data) = upload.ok_or(PipelineError::NO_FILE)?;
    let filename = uploads::sanitize_filename(&filename).ok_or(PipelineError::EMPTY_FILENAME)?;

    let path = uploads::stage(&state.config.upload_dir, filename, &data).await?;
    tracing::info!("Staged upload {} ({} bytes)", path.display(), data.len());

    // Parsed from the bytes already in hand so concurrent uploads sharing a
    // file name cannot read each other's staged copy.
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || -> PipelineResult<BatchPrediction> {
        let batch = read_batch(&data[..])?;
        service.predict_batch(batch)
    })
    .await??;

    Ok(Json(result))
}
