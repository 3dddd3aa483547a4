use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::features::LoanApplication;
use crate::model::{PredictionResult, Verdict};

/// One durable row of the prediction log.
///
/// Field order is the column order on disk and must match `HISTORY_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub annual_income: f64,
    pub debt_to_income_ratio: f64,
    pub credit_score: f64,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub gender: String,
    pub marital_status: String,
    pub education_level: String,
    pub employment_status: String,
    pub loan_purpose: String,
    pub grade_subgrade: String,
    pub prediction: Verdict,
    pub probability: f64,
}

impl LogEntry {
    pub fn new(timestamp: &str, application: &LoanApplication, result: &PredictionResult) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            annual_income: application.annual_income,
            debt_to_income_ratio: application.debt_to_income_ratio,
            credit_score: application.credit_score,
            loan_amount: application.loan_amount,
            interest_rate: application.interest_rate,
            gender: application.gender.clone(),
            marital_status: application.marital_status.clone(),
            education_level: application.education_level.clone(),
            employment_status: application.employment_status.clone(),
            loan_purpose: application.loan_purpose.clone(),
            grade_subgrade: application.grade_subgrade.clone(),
            prediction: result.prediction,
            probability: result.probability,
        }
    }
}

/// Local ISO-8601 timestamp with microseconds, e.g. `2026-10-16T09:41:07.512903`.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
