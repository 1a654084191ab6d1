//! Execution environment domain model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an environment (newtype pattern for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentId(pub i32);

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for EnvironmentId {
    fn from(id: i32) -> Self {
        EnvironmentId(id)
    }
}

impl From<EnvironmentId> for i32 {
    fn from(id: EnvironmentId) -> Self {
        id.0
    }
}

/// Claim state of an environment
///
/// BUSY while and only while exactly one run request is actively executing
/// against the environment. Mutated solely through the environment
/// repository's claim and release operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentStatus {
    /// Environment is available to be claimed
    Free,
    /// Environment is claimed by a running request
    Busy,
}

impl EnvironmentStatus {
    /// Get the stable persisted name
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentStatus::Free => "FREE",
            EnvironmentStatus::Busy => "BUSY",
        }
    }
}

impl fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One exclusive execution target (a machine, container, or venv)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Store-assigned identifier
    pub id: EnvironmentId,

    /// Human-readable environment name, used in run request logs
    pub name: String,

    /// Current claim state
    pub status: EnvironmentStatus,
}

impl Environment {
    /// Create a new free environment
    pub fn new(id: EnvironmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: EnvironmentStatus::Free,
        }
    }

    /// Check whether the environment can currently be claimed
    pub fn is_free(&self) -> bool {
        self.status == EnvironmentStatus::Free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!(EnvironmentStatus::Free.as_str(), "FREE");
        assert_eq!(EnvironmentStatus::Busy.as_str(), "BUSY");
    }

    #[test]
    fn test_new_environment_is_free() {
        let env = Environment::new(EnvironmentId(1), "my_env");
        assert!(env.is_free());
        assert_eq!(env.name, "my_env");
    }
}
