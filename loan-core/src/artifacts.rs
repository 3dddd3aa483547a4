//! Artifact Store - trained model, fitted scaler and expected columns
//!
//! Loaded once at startup and shared read-only (`Arc<ArtifactStore>`) by every
//! request for the lifetime of the process.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{FEATURE_COLUMNS_FILE, LINEAR_MODEL_FILE, ONNX_MODEL_FILE, SCALER_FILE};
use crate::features::{AlignmentError, ExpectedSchema, FeatureAligner, FittedScaler};
use crate::model::{Classifier, InferenceEngine, InferenceError, LinearClassifier, OnnxClassifier};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no model found in {0} (expected model.onnx or model.json)")]
    NoModel(PathBuf),

    #[error(transparent)]
    Schema(#[from] AlignmentError),

    #[error(transparent)]
    Model(#[from] InferenceError),
}

/// Status summary of the loaded artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub classifier: String,
    pub feature_count: usize,
    pub schema_hash: String,
    pub loaded_at: DateTime<Utc>,
}

pub struct ArtifactStore {
    schema: ExpectedSchema,
    scaler: FittedScaler,
    classifier: Arc<dyn Classifier>,
    loaded_at: DateTime<Utc>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let data = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ArtifactStore {
    /// Load every artifact from `dir`.
    ///
    /// `model.onnx` wins over `model.json` when both are present.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        log::info!("Loading artifacts from: {}", dir.display());

        let columns: Vec<String> = read_json(&dir.join(FEATURE_COLUMNS_FILE))?;
        let scaler: FittedScaler = read_json(&dir.join(SCALER_FILE))?;

        let onnx_path = dir.join(ONNX_MODEL_FILE);
        let linear_path = dir.join(LINEAR_MODEL_FILE);
        let classifier: Arc<dyn Classifier> = if onnx_path.exists() {
            Arc::new(OnnxClassifier::load(&onnx_path)?)
        } else if linear_path.exists() {
            Arc::new(LinearClassifier::load(&linear_path)?)
        } else {
            return Err(ArtifactError::NoModel(dir.to_path_buf()));
        };

        Self::from_parts(columns, scaler, classifier)
    }

    /// Assemble a store from already-loaded parts, with the same checks as `load`.
    pub fn from_parts(
        columns: Vec<String>,
        scaler: FittedScaler,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ArtifactError> {
        let schema = ExpectedSchema::new(columns)?;
        scaler.check_width(schema.width())?;

        if let Some(width) = classifier.expected_width() {
            if width != schema.width() {
                return Err(InferenceError::FeatureWidth {
                    expected: width,
                    actual: schema.width(),
                }
                .into());
            }
        }

        log::info!(
            "Artifacts ready: {} classifier, {} features, schema {:08x}",
            classifier.name(),
            schema.width(),
            schema.hash()
        );

        Ok(Self {
            schema,
            scaler,
            classifier,
            loaded_at: Utc::now(),
        })
    }

    pub fn aligner(&self) -> FeatureAligner<'_> {
        FeatureAligner::new(&self.schema, &self.scaler)
    }

    /// Engine over the loaded classifier with the default threshold.
    pub fn engine(&self) -> InferenceEngine {
        InferenceEngine::new(self.classifier.clone())
    }

    pub fn info(&self) -> ModelInfo {
        let schema = self.schema.info();
        ModelInfo {
            classifier: self.classifier.name().to_string(),
            feature_count: schema.feature_count,
            schema_hash: format!("{:08x}", schema.hash),
            loaded_at: self.loaded_at,
        }
    }
}
