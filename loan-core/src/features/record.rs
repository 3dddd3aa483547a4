//! Loan Application - schema-checked input record
//!
//! The named fields are the ones every client must send. Anything else a
//! client sends lands in `extra` and still takes part in feature expansion.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::constants::{CATEGORICAL_FIELDS, NUMERIC_FIELDS};

/// A loosely typed value for fields outside the fixed schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// One applicant as received from a client.
///
/// Categorical values are free-form: an empty or unseen value simply matches
/// no indicator column. Only the numeric fields carry a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LoanApplication {
    #[validate(custom(function = "finite"))]
    pub annual_income: f64,
    #[validate(custom(function = "finite"))]
    pub debt_to_income_ratio: f64,
    #[validate(custom(function = "finite"))]
    pub credit_score: f64,
    #[validate(custom(function = "finite"))]
    pub loan_amount: f64,
    #[validate(custom(function = "finite"))]
    pub interest_rate: f64,

    pub gender: String,
    pub marital_status: String,
    pub education_level: String,
    pub employment_status: String,
    pub loan_purpose: String,
    pub grade_subgrade: String,

    /// Additional client fields, keyed by column name
    #[serde(flatten)]
    pub extra: BTreeMap<String, FieldValue>,
}

fn finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite"))
    }
}

impl LoanApplication {
    /// Numeric attributes paired with their column names, in `NUMERIC_FIELDS` order.
    pub fn numeric_fields(&self) -> [(&'static str, f64); 5] {
        [
            (NUMERIC_FIELDS[0], self.annual_income),
            (NUMERIC_FIELDS[1], self.debt_to_income_ratio),
            (NUMERIC_FIELDS[2], self.credit_score),
            (NUMERIC_FIELDS[3], self.loan_amount),
            (NUMERIC_FIELDS[4], self.interest_rate),
        ]
    }

    /// Categorical attributes paired with their column names, in `CATEGORICAL_FIELDS` order.
    pub fn categorical_fields(&self) -> [(&'static str, &str); 6] {
        [
            (CATEGORICAL_FIELDS[0], self.gender.as_str()),
            (CATEGORICAL_FIELDS[1], self.marital_status.as_str()),
            (CATEGORICAL_FIELDS[2], self.education_level.as_str()),
            (CATEGORICAL_FIELDS[3], self.employment_status.as_str()),
            (CATEGORICAL_FIELDS[4], self.loan_purpose.as_str()),
            (CATEGORICAL_FIELDS[5], self.grade_subgrade.as_str()),
        ]
    }
}

#[cfg(test)]
pub(crate) fn sample_application() -> LoanApplication {
    LoanApplication {
        annual_income: 52_000.0,
        debt_to_income_ratio: 0.18,
        credit_score: 712.0,
        loan_amount: 12_500.0,
        interest_rate: 11.4,
        gender: "Female".to_string(),
        marital_status: "Single".to_string(),
        education_level: "Bachelor's".to_string(),
        employment_status: "Employed".to_string(),
        loan_purpose: "Car".to_string(),
        grade_subgrade: "B2".to_string(),
        extra: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_extra_fields() {
        let json = r#"{
            "annual_income": 40000, "debt_to_income_ratio": 0.2, "credit_score": 680,
            "loan_amount": 9000, "interest_rate": 12.5, "gender": "Male",
            "marital_status": "Married", "education_level": "High School",
            "employment_status": "Self-employed", "loan_purpose": "Home",
            "grade_subgrade": "C1", "id": 17, "channel": "web"
        }"#;

        let app: LoanApplication = serde_json::from_str(json).unwrap();
        assert_eq!(app.credit_score, 680.0);
        assert_eq!(app.extra.get("id"), Some(&FieldValue::Number(17.0)));
        assert_eq!(
            app.extra.get("channel"),
            Some(&FieldValue::Text("web".to_string()))
        );
    }

    #[test]
    fn test_missing_numeric_field_is_rejected() {
        let json = r#"{
            "annual_income": 40000, "debt_to_income_ratio": 0.2,
            "loan_amount": 9000, "interest_rate": 12.5, "gender": "Male",
            "marital_status": "Married", "education_level": "High School",
            "employment_status": "Self-employed", "loan_purpose": "Home",
            "grade_subgrade": "C1"
        }"#;

        let err = serde_json::from_str::<LoanApplication>(json).unwrap_err();
        assert!(err.to_string().contains("credit_score"));
    }

    #[test]
    fn test_validation() {
        let app = sample_application();
        assert!(app.validate().is_ok());

        let mut bad = sample_application();
        bad.credit_score = f64::NAN;
        bad.loan_amount = f64::INFINITY;
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["credit_score"][0].code, "finite");
        assert!(fields.contains_key("loan_amount"));
    }

    #[test]
    fn test_empty_and_negative_values_pass_validation() {
        let mut app = sample_application();
        app.gender = String::new();
        app.marital_status = String::new();
        app.debt_to_income_ratio = -0.01;
        assert!(app.validate().is_ok());
    }
}
