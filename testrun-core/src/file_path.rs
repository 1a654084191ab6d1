//! Test file path domain model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a test file path (newtype pattern for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePathId(pub i32);

impl fmt::Display for FilePathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for FilePathId {
    fn from(id: i32) -> Self {
        FilePathId(id)
    }
}

impl From<FilePathId> for i32 {
    fn from(id: FilePathId) -> Self {
        id.0
    }
}

/// A reference to one stored test file
///
/// Immutable once created. A run request links an ordered batch of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFilePath {
    /// Store-assigned identifier
    pub id: FilePathId,

    /// Path to the stored test file, as handed to the test process
    pub path: String,
}

impl TestFilePath {
    /// Create a new file path record
    pub fn new(id: FilePathId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}
