//! Central Constants
//!
//! Single source of truth for column contracts and file names.

/// Column order of the prediction log, header row included.
pub const HISTORY_COLUMNS: &[&str] = &[
    "timestamp",
    "annual_income",
    "debt_to_income_ratio",
    "credit_score",
    "loan_amount",
    "interest_rate",
    "gender",
    "marital_status",
    "education_level",
    "employment_status",
    "loan_purpose",
    "grade_subgrade",
    "prediction",
    "probability",
];

/// Columns a batch upload must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "annual_income",
    "debt_to_income_ratio",
    "credit_score",
    "loan_amount",
    "interest_rate",
    "gender",
    "marital_status",
    "education_level",
    "employment_status",
    "loan_purpose",
    "grade_subgrade",
];

/// Numeric attributes of an application, in record order.
pub const NUMERIC_FIELDS: &[&str] = &[
    "annual_income",
    "debt_to_income_ratio",
    "credit_score",
    "loan_amount",
    "interest_rate",
];

/// Categorical attributes of an application, in record order.
pub const CATEGORICAL_FIELDS: &[&str] = &[
    "gender",
    "marital_status",
    "education_level",
    "employment_status",
    "loan_purpose",
    "grade_subgrade",
];

/// Separator between field name and value in one-hot column names.
pub const DUMMY_SEPARATOR: char = '_';

/// Probability at or above which an applicant is predicted to pay back.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Decimal digits kept on surfaced probabilities.
pub const PROBABILITY_DECIMALS: usize = 4;

// ============================================
// Artifact store file names
// ============================================

/// Ordered list of expected feature columns (JSON array of strings)
pub const FEATURE_COLUMNS_FILE: &str = "feature_columns.json";

/// Fitted scaler parameters
pub const SCALER_FILE: &str = "scaler.json";

/// ONNX classifier (preferred when present)
pub const ONNX_MODEL_FILE: &str = "model.onnx";

/// Linear classifier coefficients (used when no ONNX model is present)
pub const LINEAR_MODEL_FILE: &str = "model.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_columns_wrap_required_columns() {
        assert_eq!(HISTORY_COLUMNS.len(), REQUIRED_COLUMNS.len() + 3);
        assert_eq!(HISTORY_COLUMNS[0], "timestamp");
        assert_eq!(&HISTORY_COLUMNS[1..=REQUIRED_COLUMNS.len()], REQUIRED_COLUMNS);
        assert_eq!(HISTORY_COLUMNS[HISTORY_COLUMNS.len() - 2], "prediction");
        assert_eq!(HISTORY_COLUMNS[HISTORY_COLUMNS.len() - 1], "probability");
    }

    #[test]
    fn test_required_columns_split() {
        assert_eq!(
            NUMERIC_FIELDS.len() + CATEGORICAL_FIELDS.len(),
            REQUIRED_COLUMNS.len()
        );
    }
}
