//! Configuration for twirled readout mitigation.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with TREX_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Settings for a mitigation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationConfig {
    /// Number of random twirls per circuit
    #[serde(default = "default_n_twirls")]
    pub n_twirls: usize,

    /// Total shots per circuit, split evenly across twirls
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Build second-order inverses
    #[serde(default)]
    pub second_order: bool,

    /// Seed for twirl sampling; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_n_twirls() -> usize {
    16
}

fn default_shots() -> u32 {
    8192
}

impl Default for MitigationConfig {
    fn default() -> Self {
        Self {
            n_twirls: default_n_twirls(),
            shots: default_shots(),
            second_order: false,
            seed: None,
        }
    }
}

impl MitigationConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: MitigationConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load .env file if it exists
    /// 2. Load from file if provided
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_vars(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `TREX_*` variables returned by `lookup`.
    ///
    /// Unset variables leave fields unchanged; unparsable values are logged
    /// and ignored.
    pub fn merge_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("TREX_N_TWIRLS") {
            match v.parse() {
                Ok(val) => self.n_twirls = val,
                Err(_) => warn!(value = %v, "ignoring invalid TREX_N_TWIRLS"),
            }
        }
        if let Some(v) = lookup("TREX_SHOTS") {
            match v.parse() {
                Ok(val) => self.shots = val,
                Err(_) => warn!(value = %v, "ignoring invalid TREX_SHOTS"),
            }
        }
        if let Some(v) = lookup("TREX_SECOND_ORDER") {
            match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.second_order = true,
                "0" | "false" | "no" | "off" => self.second_order = false,
                _ => warn!(value = %v, "ignoring invalid TREX_SECOND_ORDER"),
            }
        }
        if let Some(v) = lookup("TREX_SEED") {
            match v.parse() {
                Ok(val) => self.seed = Some(val),
                Err(_) => warn!(value = %v, "ignoring invalid TREX_SEED"),
            }
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_twirls == 0 {
            return Err(ConfigError::ValidationError(
                "n_twirls must be at least 1".to_string(),
            ));
        }
        if (self.shots as usize) < self.n_twirls {
            return Err(ConfigError::ValidationError(format!(
                "shots ({}) must be at least n_twirls ({})",
                self.shots, self.n_twirls
            )));
        }
        Ok(())
    }

    /// Shots given to twirl `twirl` (0-based).
    ///
    /// `shots` is split as evenly as possible: the first `shots % n_twirls`
    /// twirls get one extra shot, so the split always sums to `shots`.
    pub fn shots_for_twirl(&self, twirl: usize) -> u32 {
        let n = self.n_twirls.max(1) as u32;
        let extra = u32::from((twirl as u32) < self.shots % n);
        (self.shots / n + extra).max(1)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MitigationConfig::default();
        assert_eq!(config.n_twirls, 16);
        assert_eq!(config.shots, 8192);
        assert!(!config.second_order);
        assert!(config.validate().is_ok());
        assert_eq!(config.shots_for_twirl(0), 512);
        assert_eq!(config.shots_for_twirl(15), 512);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_twirls: 4\nshots: 1000\nsecond_order: true").unwrap();

        let config = MitigationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.n_twirls, 4);
        assert_eq!(config.shots, 1000);
        assert!(config.second_order);
        assert_eq!(config.seed, None);
        assert_eq!(config.shots_for_twirl(3), 250);
    }

    #[test]
    fn test_shot_split_keeps_remainder() {
        let config = MitigationConfig {
            n_twirls: 3,
            shots: 1000,
            ..Default::default()
        };
        let split: Vec<u32> = (0..3).map(|i| config.shots_for_twirl(i)).collect();
        assert_eq!(split, vec![334, 333, 333]);
        assert_eq!(split.iter().sum::<u32>(), 1000);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_twirls: 0").unwrap();
        assert!(matches!(
            MitigationConfig::from_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));

        assert!(matches!(
            MitigationConfig::from_file("/nonexistent/trex.yaml"),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_merge_vars() {
        let vars = |name: &str| match name {
            "TREX_N_TWIRLS" => Some("8".to_string()),
            "TREX_SECOND_ORDER" => Some("TRUE".to_string()),
            "TREX_SEED" => Some("42".to_string()),
            "TREX_SHOTS" => Some("lots".to_string()),
            _ => None,
        };
        let config = MitigationConfig::default().merge_vars(vars);
        assert_eq!(config.n_twirls, 8);
        assert!(config.second_order);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.shots, 8192);
    }

    #[test]
    fn test_validate_shots_below_twirls() {
        let config = MitigationConfig {
            n_twirls: 10,
            shots: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
