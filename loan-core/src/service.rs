//! Prediction Service - alignment, inference and logging in one call
//!
//! Both request shapes (single application, uploaded batch) go through the
//! same path: validate, align, score, then append one log batch.

use std::sync::Arc;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::artifacts::{ArtifactStore, ModelInfo};
use crate::batch::Batch;
use crate::error::{PipelineError, PipelineResult};
use crate::features::LoanApplication;
use crate::history::{timestamp_now, LogEntry, PredictionLog};
use crate::model::{InferenceEngine, PredictionResult, Verdict};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SinglePrediction {
    pub prediction: Verdict,
    pub probability: f64,
    pub timestamp: String,
    /// False when the prediction could not be written to the log
    pub logged: bool,
}

/// One uploaded row with its verdict appended.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRow {
    /// Cells as uploaded, aligned with `BatchPrediction::columns`
    pub values: Vec<String>,
    pub prediction: Verdict,
    pub probability: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPrediction {
    pub columns: Vec<String>,
    pub rows: Vec<ScoredRow>,
    pub logged: bool,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct PredictionService {
    artifacts: Arc<ArtifactStore>,
    engine: InferenceEngine,
    log: PredictionLog,
}

impl PredictionService {
    pub fn new(artifacts: Arc<ArtifactStore>, log: PredictionLog) -> Self {
        Self {
            engine: artifacts.engine(),
            artifacts,
            log,
        }
    }

    pub fn info(&self) -> ModelInfo {
        self.artifacts.info()
    }

    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    /// Score one application and log it.
    pub fn predict_one(&self, application: LoanApplication) -> PipelineResult<SinglePrediction> {
        application
            .validate()
            .map_err(|e| PipelineError::Validation(describe(&e)))?;

        let apps = std::slice::from_ref(&application);
        let result = self.score(apps)?[0];

        let timestamp = timestamp_now();
        let logged = self.record(&[LogEntry::new(&timestamp, &application, &result)]);

        log::info!(
            "Single prediction: {} ({:.4})",
            result.prediction,
            result.probability
        );

        Ok(SinglePrediction {
            prediction: result.prediction,
            probability: result.probability,
            timestamp,
            logged,
        })
    }

    /// Score every row of an uploaded batch and log them as one append.
    ///
    /// All rows share a single timestamp. A batch with no rows is returned
    /// empty and leaves the log untouched.
    pub fn predict_batch(&self, batch: Batch) -> PipelineResult<BatchPrediction> {
        for (index, row) in batch.rows.iter().enumerate() {
            row.application
                .validate()
                .map_err(|e| invalid_record(index + 1, &e))?;
        }

        if batch.is_empty() {
            return Ok(BatchPrediction {
                columns: batch.columns,
                rows: Vec::new(),
                logged: true,
            });
        }

        let applications = batch.applications();
        let results = self.score(&applications)?;

        let timestamp = timestamp_now();
        let entries: Vec<LogEntry> = applications
            .iter()
            .zip(&results)
            .map(|(app, result)| LogEntry::new(&timestamp, app, result))
            .collect();
        let logged = self.record(&entries);

        let approved = results
            .iter()
            .filter(|r| r.prediction == Verdict::WillPayBack)
            .count();
        log::info!(
            "Batch prediction: {} row(s), {} predicted to pay back",
            results.len(),
            approved
        );

        let rows = batch
            .rows
            .into_iter()
            .zip(results)
            .map(|(row, result)| ScoredRow {
                values: row.values,
                prediction: result.prediction,
                probability: result.probability,
                timestamp: timestamp.clone(),
            })
            .collect();

        Ok(BatchPrediction {
            columns: batch.columns,
            rows,
            logged,
        })
    }

    /// Every logged prediction, oldest first. `None` before the first one.
    pub fn history(&self) -> PipelineResult<Option<Vec<LogEntry>>> {
        Ok(self.log.read_all()?)
    }

    fn score(&self, applications: &[LoanApplication]) -> PipelineResult<Vec<PredictionResult>> {
        let matrix = self.artifacts.aligner().align(applications)?;
        Ok(self.engine.score(&matrix)?)
    }

    /// Append to the log. Failures are reported, never raised.
    fn record(&self, entries: &[LogEntry]) -> bool {
        match self.log.append(entries) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Prediction log write failed: {}", e);
                false
            }
        }
    }
}

// ============================================================================
// VALIDATION MESSAGES
// ============================================================================

fn reason(code: &str) -> &'static str {
    match code {
        "finite" => "is not a finite number",
        _ => "is invalid",
    }
}

/// Invalid fields in name order, each with its reason.
fn field_reasons(errors: &ValidationErrors) -> Vec<(String, &'static str)> {
    let mut fields: Vec<(String, &'static str)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let code = errs.first().map(|e| e.code.to_string()).unwrap_or_default();
            (field.to_string(), reason(&code))
        })
        .collect();
    fields.sort();
    fields
}

fn describe(errors: &ValidationErrors) -> String {
    field_reasons(errors)
        .into_iter()
        .map(|(field, reason)| format!("{} {}", field, reason))
        .collect::<Vec<_>>()
        .join(", ")
}

fn invalid_record(row: usize, errors: &ValidationErrors) -> PipelineError {
    let (field, reason) = field_reasons(errors)
        .into_iter()
        .next()
        .unwrap_or_else(|| (String::new(), "is invalid"));
    PipelineError::InvalidRecord {
        row,
        field,
        reason: reason.to_string(),
    }
}
