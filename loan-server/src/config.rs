//! Configuration module

use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid value for {var}: '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory holding feature_columns.json, scaler.json and the model
    pub artifacts_dir: PathBuf,

    /// Prediction log CSV
    pub prediction_log: PathBuf,

    /// Staging folder for batch uploads
    pub upload_dir: PathBuf,

    /// Request body limit for uploads
    pub max_upload_bytes: usize,

    /// Environment (development, production)
    pub environment: String,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: string("HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 10000)?,
            artifacts_dir: string("ARTIFACTS_DIR", "artifacts").into(),
            prediction_log: string("PREDICTION_LOG", "predictions_log.csv").into(),
            upload_dir: string("UPLOAD_DIR", "uploads").into(),
            max_upload_bytes: parsed(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            environment: string("ENVIRONMENT", "development"),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 10000);
        assert_eq!(config.prediction_log, PathBuf::from("predictions_log.csv"));
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("PORT", "8080"),
            ("ARTIFACTS_DIR", "/srv/model"),
            ("ENVIRONMENT", "production"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.artifacts_dir, PathBuf::from("/srv/model"));
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_port() {
        let err = config_with(&[("PORT", "ten")]).unwrap_err();
        assert_eq!(err.var, "PORT");
        assert_eq!(err.to_string(), "invalid value for PORT: 'ten'");
    }
}
