//! Fitted Scaler - inference-only numeric transform
//!
//! Parameters are fitted offline and loaded from the artifact store. Nothing
//! here ever refits them.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::aligner::AlignmentError;

/// Scaler parameters, one entry per expected column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },

    /// `(x - data_min) / (data_max - data_min) * (hi - lo) + lo`
    MinMax {
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Zero or non-finite spreads are treated as 1, like scikit-learn does.
fn nonzero(spread: f64) -> f64 {
    if spread == 0.0 || !spread.is_finite() {
        1.0
    } else {
        spread
    }
}

impl FittedScaler {
    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        match self {
            FittedScaler::Standard { mean, .. } => mean.len(),
            FittedScaler::MinMax { data_min, .. } => data_min.len(),
        }
    }

    /// Check internal consistency and that the scaler fits `width` columns.
    pub fn check_width(&self, width: usize) -> Result<(), AlignmentError> {
        let (a, b) = match self {
            FittedScaler::Standard { mean, scale } => (mean.len(), scale.len()),
            FittedScaler::MinMax {
                data_min, data_max, ..
            } => (data_min.len(), data_max.len()),
        };

        if a != b {
            return Err(AlignmentError::InvalidSchema(format!(
                "scaler parameter lengths differ ({} vs {})",
                a, b
            )));
        }
        if a != width {
            return Err(AlignmentError::WidthMismatch {
                expected: width,
                actual: a,
            });
        }
        Ok(())
    }

    /// Scale a reconciled matrix in place.
    pub fn transform(&self, matrix: &mut Array2<f64>) -> Result<(), AlignmentError> {
        self.check_width(matrix.ncols())?;

        match self {
            FittedScaler::Standard { mean, scale } => {
                for mut row in matrix.axis_iter_mut(Axis(0)) {
                    for (j, x) in row.iter_mut().enumerate() {
                        *x = (*x - mean[j]) / nonzero(scale[j]);
                    }
                }
            }
            FittedScaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => {
                for mut row in matrix.axis_iter_mut(Axis(0)) {
                    for (j, x) in row.iter_mut().enumerate() {
                        let range = nonzero(data_max[j] - data_min[j]);
                        *x = (*x - data_min[j]) / range * (hi - lo) + lo;
                    }
                }
            }
        }

        Ok(())
    }
}
