//! ONNX Classifier - ONNX Runtime integration
//!
//! Loads a classifier exported from scikit-learn (skl2onnx or onnxmltools).
//! Those exports emit probabilities either as a `[N, classes]` tensor or,
//! with ZipMap enabled, as `seq(map(int64, float))`. Both are handled.

use std::path::Path;

use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use parking_lot::Mutex;

use super::inference::{Classifier, InferenceError};
use crate::features::FeatureMatrix;

/// Index of the positive ("will pay back") class
const POSITIVE_CLASS: i64 = 1;

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load ONNX model from file
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError::Load(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Load(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::Load(format!("Failed to load model: {}", e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| InferenceError::Load("Model defines no inputs".to_string()))?;

        // Prefer the probability output over the label output
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::Load("Model defines no outputs".to_string()))?;

        log::info!(
            "ONNX model loaded (input: {}, output: {})",
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    fn extract(&self, output: &DynValue, rows: usize) -> Result<Vec<f64>, InferenceError> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return positive_from_tensor(&dims, data, rows);
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return positive_from_zipmap(output);
        }

        Err(InferenceError::Run(format!(
            "Unsupported output type for '{}'",
            self.output_name
        )))
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn positive_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        let rows = features.nrows();
        if rows == 0 {
            return Ok(Vec::new());
        }

        let input = features.mapv(|v| v as f32);
        let input_tensor = Tensor::from_array(input)
            .map_err(|e| InferenceError::Run(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| InferenceError::Run(format!("Inference failed: {}", e)))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            InferenceError::Run(format!("Missing output '{}'", self.output_name))
        })?;

        self.extract(output, rows)
    }
}

/// Positive-class column of a probability tensor.
///
/// Accepts `[rows, classes]` (class 1 taken when there are two or more),
/// `[rows, 1]` and `[rows]`.
pub(crate) fn positive_from_tensor(
    dims: &[i64],
    data: &[f32],
    rows: usize,
) -> Result<Vec<f64>, InferenceError> {
    let (n, classes) = match *dims {
        [n, c] => (n as usize, c as usize),
        [n] => (n as usize, 1),
        _ => {
            return Err(InferenceError::Run(format!(
                "Unexpected probability shape {:?}",
                dims
            )))
        }
    };

    if n != rows {
        return Err(InferenceError::RowCount {
            expected: rows,
            actual: n,
        });
    }
    if classes == 0 || data.len() < n * classes {
        return Err(InferenceError::Run(format!(
            "Probability tensor {:?} holds {} values",
            dims,
            data.len()
        )));
    }

    let column = if classes >= 2 { POSITIVE_CLASS as usize } else { 0 };
    Ok((0..n).map(|i| data[i * classes + column] as f64).collect())
}

/// Positive-class probability from a ZipMap `seq(map(int64, float))` output.
fn positive_from_zipmap(output: &DynValue) -> Result<Vec<f64>, InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| InferenceError::Run(format!("Failed to downcast to sequence: {}", e)))?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| InferenceError::Run(format!("Failed to read sequence: {}", e)))?;

    let mut probabilities = Vec::with_capacity(maps.len());
    for (row, map_value) in maps.iter().enumerate() {
        let kv_pairs = map_value
            .try_extract_key_values::<i64, f32>()
            .map_err(|e| InferenceError::Run(format!("Failed to read map: {}", e)))?;

        let p = kv_pairs
            .iter()
            .find(|(class_id, _)| *class_id == POSITIVE_CLASS)
            .map(|(_, p)| *p as f64)
            .ok_or_else(|| {
                InferenceError::Run(format!("Row {} has no class {} probability", row, POSITIVE_CLASS))
            })?;
        probabilities.push(p);
    }

    Ok(probabilities)
}
