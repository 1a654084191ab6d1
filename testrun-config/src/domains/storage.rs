//! Upload storage configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded test files are stored under
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// File extensions accepted for uploaded test files
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Validatable for StorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.uploads_dir.as_os_str().is_empty() {
            return Err(self.validation_error("uploads_dir cannot be empty"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(self.validation_error("allowed_extensions cannot be empty"));
        }

        for ext in &self.allowed_extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(self.validation_error(format!(
                    "allowed extension {:?} must start with '.' and name a suffix",
                    ext
                )));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "storage"
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".py".to_string()]
}
