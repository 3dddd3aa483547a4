//! Linear Classifier - logistic regression from exported coefficients
//!
//! Used when the artifact store carries `model.json` instead of an ONNX graph.

use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::inference::{Classifier, InferenceError};
use crate::features::FeatureMatrix;

/// `sigmoid(x . coefficients + intercept)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LinearClassifier {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        log::info!("Loading linear model from: {}", path.display());

        let data = fs::read(path)
            .map_err(|e| InferenceError::Load(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&data)
            .map_err(|e| InferenceError::Load(format!("{}: {}", path.display(), e)))
    }

    pub fn width(&self) -> usize {
        self.coefficients.len()
    }
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &str {
        "linear"
    }

    fn expected_width(&self) -> Option<usize> {
        Some(self.width())
    }

    fn positive_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        if features.ncols() != self.width() {
            return Err(InferenceError::FeatureWidth {
                expected: self.width(),
                actual: features.ncols(),
            });
        }

        let weights = Array1::from(self.coefficients.clone());
        let logits = features.dot(&weights);
        Ok(logits.iter().map(|z| sigmoid(z + self.intercept)).collect())
    }
}
