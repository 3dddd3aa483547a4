//! Error handling for the prediction pipeline.
//!
//! Validation failures (missing columns, empty uploads, malformed records)
//! are client errors. Everything downstream of validation propagates as-is.

use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::batch::BatchError;
use crate::features::AlignmentError;
use crate::history::LogReadError;
use crate::model::InferenceError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("{0}")]
    EmptyUpload(&'static str),

    /// `row` is 1-based and excludes the header line
    #[error("row {row}: {field} {reason}")]
    InvalidRecord {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("invalid application: {0}")]
    Validation(String),

    #[error("malformed upload: {0}")]
    MalformedUpload(String),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    LogRead(#[from] LogReadError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl PipelineError {
    pub const NO_FILE: Self = PipelineError::EmptyUpload("No file uploaded");
    pub const EMPTY_FILENAME: Self = PipelineError::EmptyUpload("Empty filename");

    /// True for failures caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingColumns(_)
                | PipelineError::EmptyUpload(_)
                | PipelineError::InvalidRecord { .. }
                | PipelineError::Validation(_)
                | PipelineError::MalformedUpload(_)
                | PipelineError::Alignment(AlignmentError::NonFinite { .. })
        )
    }
}

impl From<BatchError> for PipelineError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::MissingColumns(missing) => PipelineError::MissingColumns(missing),
            BatchError::InvalidRecord { row, field, reason } => {
                PipelineError::InvalidRecord { row, field, reason }
            }
            BatchError::Csv(e) => PipelineError::MalformedUpload(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(PipelineError::MissingColumns(vec!["credit_score".into()]).is_client_error());
        assert!(PipelineError::NO_FILE.is_client_error());
        assert!(PipelineError::Validation("x".into()).is_client_error());
        assert!(PipelineError::Alignment(AlignmentError::NonFinite {
            row: 0,
            field: "x".into()
        })
        .is_client_error());

        assert!(!PipelineError::Inference(InferenceError::Run("x".into())).is_client_error());
        assert!(!PipelineError::Alignment(AlignmentError::WidthMismatch {
            expected: 1,
            actual: 2
        })
        .is_client_error());
    }

    #[test]
    fn test_messages() {
        assert_eq!(PipelineError::NO_FILE.to_string(), "No file uploaded");
        assert_eq!(PipelineError::EMPTY_FILENAME.to_string(), "Empty filename");
        assert_eq!(
            PipelineError::MissingColumns(vec!["credit_score".into(), "gender".into()]).to_string(),
            "Missing columns: [\"credit_score\", \"gender\"]"
        );
    }

    #[test]
    fn test_batch_error_conversion() {
        let err: PipelineError = BatchError::MissingColumns(vec!["loan_amount".into()]).into();
        assert!(matches!(err, PipelineError::MissingColumns(ref m) if m[0] == "loan_amount"));
    }
}
