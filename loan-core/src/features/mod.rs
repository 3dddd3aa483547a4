//! Features Module - Feature Alignment Engine
//!
//! Turns loan applications into the exact numeric matrix the trained model
//! expects. The column contract lives in `layout`, the numeric transform in
//! `scaler`, and the mapping itself in `aligner`.

pub mod aligner;
pub mod layout;
pub mod record;
pub mod scaler;


// Re-export common types
pub use aligner::{expand, AlignmentError, FeatureAligner, FeatureMatrix};
pub use layout::{ExpectedSchema, SchemaInfo};
pub use record::{FieldValue, LoanApplication};
pub use scaler::FittedScaler;
