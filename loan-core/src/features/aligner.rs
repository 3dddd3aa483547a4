//! Feature Aligner - raw applications to model-ready matrices
//!
//! Three steps, always in this order:
//! 1. expand: numeric fields pass through, text fields become `{field}_{value}` indicators
//! 2. reconcile: reindex onto the expected schema (absent -> 0, unknown -> dropped)
//! 3. scale: apply the fitted scaler

use ndarray::Array2;
use thiserror::Error;

use super::layout::ExpectedSchema;
use super::record::{FieldValue, LoanApplication};
use super::scaler::FittedScaler;
use crate::constants::DUMMY_SEPARATOR;

/// Rows = applications, columns = expected schema order.
pub type FeatureMatrix = Array2<f64>;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("invalid feature schema: {0}")]
    InvalidSchema(String),

    #[error("feature width mismatch: schema has {expected} columns, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("record {row}: field '{field}' is not a finite number")]
    NonFinite { row: usize, field: String },
}

/// Name of the indicator column for a categorical value.
pub fn dummy_column(field: &str, value: &str) -> String {
    format!("{}{}{}", field, DUMMY_SEPARATOR, value)
}

/// One-hot expansion of a single application.
///
/// Returns `(column, value)` pairs; indicator columns carry 1.0.
pub fn expand(record: &LoanApplication) -> Vec<(String, f64)> {
    let mut expanded = Vec::with_capacity(11 + record.extra.len());

    for (name, value) in record.numeric_fields() {
        expanded.push((name.to_string(), value));
    }
    for (name, value) in record.categorical_fields() {
        expanded.push((dummy_column(name, value), 1.0));
    }
    for (name, value) in &record.extra {
        match value {
            FieldValue::Number(n) => expanded.push((name.clone(), *n)),
            FieldValue::Text(s) => expanded.push((dummy_column(name, s), 1.0)),
        }
    }

    expanded
}

/// Maps applications onto the expected schema and scales them.
///
/// Borrows the artifact store's schema and scaler; holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct FeatureAligner<'a> {
    schema: &'a ExpectedSchema,
    scaler: &'a FittedScaler,
}

impl<'a> FeatureAligner<'a> {
    pub fn new(schema: &'a ExpectedSchema, scaler: &'a FittedScaler) -> Self {
        Self { schema, scaler }
    }

    /// Expansion + reconciliation, without scaling.
    pub fn reconcile(&self, records: &[LoanApplication]) -> Result<FeatureMatrix, AlignmentError> {
        let mut matrix = Array2::<f64>::zeros((records.len(), self.schema.width()));

        for (row, record) in records.iter().enumerate() {
            for (column, value) in expand(record) {
                if !value.is_finite() {
                    return Err(AlignmentError::NonFinite { row, field: column });
                }
                if let Some(col) = self.schema.position(&column) {
                    matrix[[row, col]] = value;
                }
            }
        }

        Ok(matrix)
    }

    /// Full alignment: expansion, reconciliation and scaling.
    pub fn align(&self, records: &[LoanApplication]) -> Result<FeatureMatrix, AlignmentError> {
        let mut matrix = self.reconcile(records)?;
        self.scaler.transform(&mut matrix)?;

        log::debug!(
            "Aligned {} record(s) onto {} features (schema {:08x})",
            matrix.nrows(),
            matrix.ncols(),
            self.schema.hash()
        );

        Ok(matrix)
    }
}
