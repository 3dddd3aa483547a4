//! Expected Schema - the feature layout the trained model was fitted on
//!
//! **This value object controls the shape of every feature vector.**
//!
//! The column list comes from the artifact store and is never derived from
//! request data. Whatever categories a request happens to carry, the aligner
//! reconciles them against this list.

use std::collections::HashMap;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::aligner::AlignmentError;

// ============================================================================
// EXPECTED SCHEMA
// ============================================================================

/// Ordered feature columns with an O(1) name lookup.
#[derive(Debug, Clone)]
pub struct ExpectedSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    hash: u32,
}

impl ExpectedSchema {
    /// Build a schema, rejecting empty lists, blank names and duplicates.
    pub fn new(columns: Vec<String>) -> Result<Self, AlignmentError> {
        if columns.is_empty() {
            return Err(AlignmentError::InvalidSchema(
                "expected column list is empty".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(AlignmentError::InvalidSchema(format!(
                    "column {} has an empty name",
                    i
                )));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(AlignmentError::InvalidSchema(format!(
                    "duplicate column '{}'",
                    name
                )));
            }
        }

        let hash = compute_schema_hash(&columns);
        Ok(Self {
            columns,
            index,
            hash,
        })
    }

    /// Number of features per vector
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column, if the model knows it
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// CRC32 of the ordered column names
    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn info(&self) -> SchemaInfo {
        SchemaInfo {
            hash: self.hash,
            feature_count: self.width(),
            feature_names: self.columns.clone(),
        }
    }
}

// ============================================================================
// SCHEMA HASH
// ============================================================================

/// Compute CRC32 hash of an ordered column list.
///
/// Any change in names or order yields a different hash, so two processes
/// agree on the feature layout iff their hashes match.
pub fn compute_schema_hash(columns: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }
    hasher.finalize()
}

/// Serializable layout summary for status endpoints and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_position_lookup() {
        let schema = ExpectedSchema::new(cols(&["credit_score", "gender_Male", "gender_Female"]))
            .unwrap();
        assert_eq!(schema.width(), 3);
        assert_eq!(schema.position("credit_score"), Some(0));
        assert_eq!(schema.position("gender_Female"), Some(2));
        assert_eq!(schema.position("gender_Other"), None);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(ExpectedSchema::new(vec![]).is_err());
        assert!(ExpectedSchema::new(cols(&["a", " "])).is_err());
        assert!(ExpectedSchema::new(cols(&["a", "b", "a"])).is_err());
    }

    #[test]
    fn test_hash_depends_on_order() {
        let a = compute_schema_hash(&cols(&["x", "y"]));
        let b = compute_schema_hash(&cols(&["y", "x"]));
        assert_ne!(a, b);
        assert_eq!(a, compute_schema_hash(&cols(&["x", "y"])));
    }

    #[test]
    fn test_separator_prevents_concatenation_collisions() {
        let a = compute_schema_hash(&cols(&["ab", "c"]));
        let b = compute_schema_hash(&cols(&["a", "bc"]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_schema_info() {
        let schema = ExpectedSchema::new(cols(&["a", "b"])).unwrap();
        let info = schema.info();
        assert_eq!(info.feature_count, 2);
        assert_eq!(info.hash, schema.hash());
        assert_eq!(info.feature_names, cols(&["a", "b"]));
    }
}
