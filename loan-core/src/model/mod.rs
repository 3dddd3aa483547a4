//! Model Module - Inference Engine
//!
//! The engine is backend-agnostic: the artifact store decides whether an ONNX
//! graph or an exported linear model sits behind the `Classifier` trait.

pub mod inference;
pub mod linear;
pub mod onnx;
pub mod threshold;

// Re-export common types
pub use inference::{round_probability, Classifier, InferenceEngine, InferenceError, PredictionResult};
pub use linear::LinearClassifier;
pub use onnx::OnnxClassifier;
pub use threshold::{DecisionThreshold, Verdict};
