//! Configuration loading and environment variable handling

use crate::domains::TestrunConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "TESTRUN".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<TestrunConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: TestrunConfig = serde_yaml::from_str(&content)?;

        // Apply environment variable overrides
        self.apply_env_overrides(&mut config)?;

        // Validate all domains
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<TestrunConfig> {
        let mut config = TestrunConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<TestrunConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut TestrunConfig) -> ConfigResult<()> {
        self.apply_execution_overrides(&mut config.execution)?;
        self.apply_storage_overrides(&mut config.storage)?;
        self.apply_logging_overrides(&mut config.logging)?;

        Ok(())
    }

    /// Apply execution config overrides
    fn apply_execution_overrides(
        &self,
        config: &mut crate::domains::execution::ExecutionConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("TEST_RUN_REQUEST_TIMEOUT_SECONDS") {
            let seconds: u64 = timeout.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid TEST_RUN_REQUEST_TIMEOUT_SECONDS: {}", e))
            })?;
            config.test_run_timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(max_retry) = self.get_env_var("MAX_RETRY") {
            config.max_retry = max_retry
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid MAX_RETRY: {}", e)))?;
        }

        if let Ok(program) = self.get_env_var("PROGRAM") {
            config.program = program;
        }

        Ok(())
    }

    /// Apply storage config overrides
    fn apply_storage_overrides(
        &self,
        config: &mut crate::domains::storage::StorageConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("UPLOADS_DIR") {
            config.uploads_dir = dir.into();
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.level = level
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", e)))?;
        }

        Ok(())
    }

    /// Read a prefixed environment variable
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "execution:\n  program: python\n  test_run_timeout: 60\n  max_retry: 3\n"
        )
        .unwrap();

        let loader = ConfigLoader::with_prefix("TESTRUN_FILE_TEST");
        let config = loader.from_file(file.path()).unwrap();
        assert_eq!(config.execution.program, "python");
        assert_eq!(config.execution.test_run_timeout, Duration::from_secs(60));
        assert_eq!(config.execution.max_retry, 3);
        // Untouched domains keep their defaults
        assert_eq!(config.storage.allowed_extensions, vec![".py".to_string()]);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "execution:\n  max_retry: 0\n").unwrap();

        let loader = ConfigLoader::with_prefix("TESTRUN_BAD_FILE_TEST");
        assert!(loader.from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        // Unique prefix so parallel tests cannot interfere
        std::env::set_var("TESTRUN_ENV_TEST_TEST_RUN_REQUEST_TIMEOUT_SECONDS", "42");
        std::env::set_var("TESTRUN_ENV_TEST_MAX_RETRY", "5");

        let loader = ConfigLoader::with_prefix("TESTRUN_ENV_TEST");
        let config = loader.from_env().unwrap();
        assert_eq!(config.execution.test_run_timeout, Duration::from_secs(42));
        assert_eq!(config.execution.max_retry, 5);

        std::env::remove_var("TESTRUN_ENV_TEST_TEST_RUN_REQUEST_TIMEOUT_SECONDS");
        std::env::remove_var("TESTRUN_ENV_TEST_MAX_RETRY");
    }

    #[test]
    fn test_invalid_env_value_is_rejected() {
        std::env::set_var("TESTRUN_ENV_BAD_MAX_RETRY", "lots");

        let loader = ConfigLoader::with_prefix("TESTRUN_ENV_BAD");
        assert!(loader.from_env().is_err());

        std::env::remove_var("TESTRUN_ENV_BAD_MAX_RETRY");
    }
}
