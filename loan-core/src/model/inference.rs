//! Inference Engine - classifier scoring and decision
//!
//! Runs whichever classifier the artifact store loaded, applies the decision
//! threshold and rounds probabilities exactly once, here, so that what the
//! caller returns and what the log stores always agree.

use std::num::ParseFloatError;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::threshold::{DecisionThreshold, Verdict};
use crate::constants::PROBABILITY_DECIMALS;
use crate::features::FeatureMatrix;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model load failed: {0}")]
    Load(String),

    #[error("model run failed: {0}")]
    Run(String),

    #[error("model expects {expected} features, got {actual}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("model returned {actual} probabilities for {expected} rows")]
    RowCount { expected: usize, actual: usize },

    #[error("model returned invalid probability {value} for row {row}")]
    InvalidProbability { row: usize, value: f64 },
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for binary classifiers (ONNX, linear, ...)
pub trait Classifier: Send + Sync {
    /// Short backend name for status output
    fn name(&self) -> &str;

    /// Feature count the model was fitted on, when the backend knows it up front.
    fn expected_width(&self) -> Option<usize> {
        None
    }

    /// Probability of the positive ("will pay back") class, one per row.
    fn positive_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError>;
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Prediction output for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Pay-back probability, rounded to `PROBABILITY_DECIMALS`
    pub probability: f64,
    pub prediction: Verdict,
}

/// Round to `PROBABILITY_DECIMALS` digits from the exact stored value.
///
/// Goes through the decimal expansion so that a double just below a half
/// step (0.99995 is stored as 0.99994999...) rounds down.
pub fn round_probability(p: f64) -> Result<f64, ParseFloatError> {
    format!("{:.*}", PROBABILITY_DECIMALS, p).parse()
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Clone)]
pub struct InferenceEngine {
    classifier: Arc<dyn Classifier>,
    threshold: DecisionThreshold,
}

impl InferenceEngine {
    /// Engine with the default 0.5 threshold.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self::with_threshold(classifier, DecisionThreshold::default())
    }

    pub fn with_threshold(classifier: Arc<dyn Classifier>, threshold: DecisionThreshold) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    pub fn threshold(&self) -> DecisionThreshold {
        self.threshold
    }

    /// Score every row of an aligned matrix.
    ///
    /// The verdict comes from the raw probability; only the surfaced value is
    /// rounded. Classifier failures propagate unchanged.
    pub fn score(&self, features: &FeatureMatrix) -> Result<Vec<PredictionResult>, InferenceError> {
        let start_time = Instant::now();
        let rows = features.nrows();

        let probabilities = self.classifier.positive_proba(features)?;
        if probabilities.len() != rows {
            return Err(InferenceError::RowCount {
                expected: rows,
                actual: probabilities.len(),
            });
        }

        let results = probabilities
            .into_iter()
            .enumerate()
            .map(|(row, p)| {
                if !(0.0..=1.0).contains(&p) {
                    return Err(InferenceError::InvalidProbability { row, value: p });
                }
                let probability = round_probability(p)
                    .map_err(|_| InferenceError::InvalidProbability { row, value: p })?;
                Ok(PredictionResult {
                    probability,
                    prediction: self.threshold.decide(p),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Scored {} row(s) with {} in {}us",
            rows,
            self.classifier.name(),
            start_time.elapsed().as_micros()
        );

        Ok(results)
    }
}
