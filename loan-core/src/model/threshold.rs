//! Decision Threshold
//!
//! Turns a pay-back probability into a verdict. The threshold is fixed for
//! the lifetime of an inference engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_THRESHOLD;

/// Binary outcome surfaced to clients and written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Will Pay Back")]
    WillPayBack,
    #[serde(rename = "Will NOT Pay Back")]
    WillNotPayBack,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::WillPayBack => "Will Pay Back",
            Verdict::WillNotPayBack => "Will NOT Pay Back",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Probability cut-off, inclusive on the pay-back side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionThreshold(f64);

impl DecisionThreshold {
    /// Returns `None` unless `value` lies in [0, 1].
    pub fn new(value: f64) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `probability >= threshold` pays back.
    pub fn decide(&self, probability: f64) -> Verdict {
        if probability >= self.0 {
            Verdict::WillPayBack
        } else {
            Verdict::WillNotPayBack
        }
    }
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}
