//! Loan Core - repayment scoring pipeline
//!
//! Feature alignment, model inference and the durable prediction log, shared
//! by the HTTP server and anything else that needs to score applications.

pub mod artifacts;
pub mod batch;
pub mod constants;
pub mod error;
pub mod features;
pub mod history;
pub mod model;
pub mod service;

pub use artifacts::{ArtifactError, ArtifactStore, ModelInfo};
pub use batch::{read_batch, Batch, BatchError};
pub use error::{PipelineError, PipelineResult};
pub use features::{FeatureAligner, FieldValue, LoanApplication};
pub use history::{LogEntry, PredictionLog};
pub use model::{DecisionThreshold, InferenceEngine, Verdict};
pub use service::{BatchPrediction, PredictionService, ScoredRow, SinglePrediction};
