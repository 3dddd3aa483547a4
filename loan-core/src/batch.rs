//! Batch Reader - uploaded CSV files to applications
//!
//! The required column set is checked before any row is parsed, so a file
//! missing columns never reaches alignment.

use std::collections::{BTreeMap, HashMap};
use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::constants::{CATEGORICAL_FIELDS, NUMERIC_FIELDS, REQUIRED_COLUMNS};
use crate::features::{FieldValue, LoanApplication};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Missing columns: {0:?}")]
    MissingColumns(Vec<String>),

    /// `row` is 1-based and excludes the header line
    #[error("row {row}: {field} {reason}")]
    InvalidRecord {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One uploaded row: the typed application plus the cells as uploaded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub application: LoanApplication,
    /// Raw cell values, aligned with `Batch::columns`
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub columns: Vec<String>,
    pub rows: Vec<BatchRow>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn applications(&self) -> Vec<LoanApplication> {
        self.rows.iter().map(|r| r.application.clone()).collect()
    }
}

/// Required columns absent from `headers`, in required order.
pub fn missing_columns(headers: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect()
}

pub fn read_batch<R: io::Read>(reader: R) -> Result<Batch, BatchError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let missing = missing_columns(&columns);
    if !missing.is_empty() {
        return Err(BatchError::MissingColumns(missing));
    }

    let records = reader
        .records()
        .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()?;

    // First occurrence wins on duplicate headers
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (i, name) in columns.iter().enumerate() {
        position.entry(name.as_str()).or_insert(i);
    }

    let extra_columns: Vec<(usize, &str, bool)> = columns
        .iter()
        .enumerate()
        .filter(|(i, name)| {
            !REQUIRED_COLUMNS.contains(&name.as_str()) && position.get(name.as_str()) == Some(i)
        })
        .map(|(i, name)| (i, name.as_str(), is_numeric_column(&records, i)))
        .collect();

    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        let cell = |name: &str| record.get(position[name]).unwrap_or("");

        let mut numeric = [0.0f64; 5];
        for (slot, &field) in numeric.iter_mut().zip(NUMERIC_FIELDS) {
            *slot = parse_number(cell(field)).map_err(|reason| BatchError::InvalidRecord {
                row,
                field: field.to_string(),
                reason,
            })?;
        }

        let text = |i: usize| cell(CATEGORICAL_FIELDS[i]).to_string();

        let mut extra = BTreeMap::new();
        for &(i, name, numeric_column) in &extra_columns {
            let value = record.get(i).unwrap_or("");
            if value.trim().is_empty() {
                continue;
            }
            let value = match (numeric_column, parse_number(value)) {
                (true, Ok(n)) => FieldValue::Number(n),
                _ => FieldValue::Text(value.to_string()),
            };
            extra.insert(name.to_string(), value);
        }

        let application = LoanApplication {
            annual_income: numeric[0],
            debt_to_income_ratio: numeric[1],
            credit_score: numeric[2],
            loan_amount: numeric[3],
            interest_rate: numeric[4],
            gender: text(0),
            marital_status: text(1),
            education_level: text(2),
            employment_status: text(3),
            loan_purpose: text(4),
            grade_subgrade: text(5),
            extra,
        };

        rows.push(BatchRow {
            application,
            values: record.iter().map(|v| v.to_string()).collect(),
        });
    }

    log::debug!("Read batch of {} row(s), {} column(s)", rows.len(), columns.len());
    Ok(Batch { columns, rows })
}

fn parse_number(cell: &str) -> Result<f64, String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Err("is missing".to_string());
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| format!("is not a number: '{}'", cell))
}

/// A column is numeric when every non-empty cell parses as a number.
fn is_numeric_column(records: &[csv::StringRecord], column: usize) -> bool {
    records
        .iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.trim().is_empty())
        .all(|v| v.trim().parse::<f64>().is_ok())
}
