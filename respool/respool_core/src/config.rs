//! Pool configuration.
//!
//! ```toml
//! capacity = 3
//! acquire_timeout_ms = 5000
//!
//! [[resources]]
//! kind = "GPU"
//! count = 2
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to load configuration from {path}: {source}")]
    LoadFailed {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema
    #[error("failed to parse configuration: {0}")]
    ParseFailed(#[from] toml::de::Error),

    /// The configuration parsed but is inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A group of typed resources registered at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedSeed {
    /// Type tag of the resources
    pub kind: String,

    /// How many resources of this type to register
    #[serde(default = "default_seed_count")]
    pub count: usize,
}

fn default_seed_count() -> usize {
    1
}

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Initial number of resources in the bounded pool
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Default wait for bounded requests (milliseconds)
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Typed resources to register at startup
    #[serde(default)]
    pub resources: Vec<TypedSeed>,
}

fn default_capacity() -> usize {
    3
}

fn default_acquire_timeout_ms() -> u64 {
    5000
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            resources: Vec::new(),
        }
    }
}

impl PoolConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration for inconsistencies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for seed in &self.resources {
            if seed.kind.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "typed resource kind must not be empty".to_string(),
                ));
            }
            if seed.count == 0 {
                return Err(ConfigError::Invalid(format!(
                    "typed resource '{}' has a count of zero",
                    seed.kind
                )));
            }
        }
        Ok(())
    }

    /// Default wait for bounded requests.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = PoolConfig::from_toml_str("").unwrap();
        assert_eq!(config, PoolConfig::default());
        assert_eq!(config.capacity, 3);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_seeds() {
        let config = PoolConfig::from_toml_str(
            r#"
            capacity = 1
            acquire_timeout_ms = 100

            [[resources]]
            kind = "GPU"
            count = 2

            [[resources]]
            kind = "FPGA"
            "#,
        )
        .unwrap();

        assert_eq!(config.capacity, 1);
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.resources[1].count, 1);
    }

    #[test]
    fn test_rejects_zero_count() {
        let err = PoolConfig::from_toml_str(
            r#"
            [[resources]]
            kind = "GPU"
            count = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = PoolConfig::from_toml_str("capacity = \"three\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "capacity = 7").unwrap();

        let config = PoolConfig::load(file.path()).unwrap();
        assert_eq!(config.capacity, 7);

        let missing = PoolConfig::load("/nonexistent/respool.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::LoadFailed { .. }));
    }
}
