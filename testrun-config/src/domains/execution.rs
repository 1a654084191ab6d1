//! Test run execution configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Test run execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// External program the test file batch is handed to
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments passed to the program before the file paths
    #[serde(default)]
    pub args: Vec<String>,

    /// Wall-clock timeout for one test run
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_test_run_timeout"
    )]
    pub test_run_timeout: Duration,

    /// How many times a contended environment claim is retried before the
    /// request is marked failed-to-start
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            test_run_timeout: default_test_run_timeout(),
            max_retry: default_max_retry(),
        }
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.program, "program", self.domain_name())?;

        validate_positive(
            self.test_run_timeout.as_secs(),
            "test_run_timeout",
            self.domain_name(),
        )?;

        validate_positive(self.max_retry, "max_retry", self.domain_name())?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}

fn default_program() -> String {
    "pytest".to_string()
}

fn default_test_run_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_max_retry() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutionConfig::default();
        assert_eq!(config.program, "pytest");
        assert!(config.args.is_empty());
        assert_eq!(config.test_run_timeout, Duration::from_secs(300));
        assert_eq!(config.max_retry, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_program() {
        let config = ExecutionConfig {
            program: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = ExecutionConfig {
            test_run_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_roundtrip() {
        let config = ExecutionConfig {
            test_run_timeout: Duration::from_secs(120),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("test_run_timeout: 120"));
        let parsed: ExecutionConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.test_run_timeout, Duration::from_secs(120));
    }
}
