//! Upload storage for submitted test files
//!
//! Accepts raw file bytes, validates the name against the configured
//! test-file extensions, and writes them under the uploads directory with a
//! UUID-prefixed name so two uploads with the same name never collide. The
//! returned path is what goes into the file path repository and, from there,
//! onto the test process command line.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use testrun_config::StorageConfig;

/// Upload storage errors
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file extension for {name:?}: expected one of {allowed:?}")]
    UnsupportedExtension { name: String, allowed: Vec<String> },

    #[error("Invalid file name {name:?}")]
    InvalidName { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores uploaded test files on the local filesystem
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    allowed_extensions: Vec<String>,
}

impl UploadStore {
    /// Create an upload store from the storage configuration
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.uploads_dir.clone(),
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    /// Validate a file name against the allowed test-file extensions
    pub fn validate_name(&self, name: &str) -> Result<(), UploadError> {
        // Reject names that could escape the uploads directory
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if base.is_empty() || base != name {
            return Err(UploadError::InvalidName {
                name: name.to_string(),
            });
        }

        if self.allowed_extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            Ok(())
        } else {
            Err(UploadError::UnsupportedExtension {
                name: name.to_string(),
                allowed: self.allowed_extensions.clone(),
            })
        }
    }

    /// Store uploaded bytes, returning the path to hand to the test process
    pub async fn store(&self, name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        self.validate_name(name)?;

        fs::create_dir_all(&self.root).await?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), name);
        let path = self.root.join(stored_name);
        fs::write(&path, bytes).await?;

        debug!("Stored uploaded file {} at {}", name, path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}
