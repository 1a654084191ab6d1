//! Run request domain model and status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::environment::EnvironmentId;
use crate::file_path::FilePathId;

/// Unique identifier for a run request (newtype pattern for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunRequestId(pub i32);

impl fmt::Display for RunRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for RunRequestId {
    fn from(id: i32) -> Self {
        RunRequestId(id)
    }
}

impl From<RunRequestId> for i32 {
    fn from(id: RunRequestId) -> Self {
        id.0
    }
}

/// Run request status
///
/// Transitions are forward-only:
/// `PENDING -> [RETRYING ->]* RUNNING -> SUCCESS | FAILED`, or
/// `RETRYING -> FAILED_TO_START` once retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Request created, not yet picked up
    Pending,
    /// Environment was busy; a delayed re-attempt is scheduled
    Retrying,
    /// Test process is executing
    Running,
    /// Test process exited 0
    Success,
    /// Test process exited non-zero, timed out, or failed to launch
    Failed,
    /// Environment never became free within the retry budget
    FailedToStart,
}

impl RunStatus {
    /// Check if the request is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Failed | RunStatus::FailedToStart
        )
    }

    /// Get the stable persisted name
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Retrying => "RETRYING",
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
            RunStatus::FailedToStart => "FAILED_TO_START",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One request to execute a batch of test files against one environment
///
/// Mutated exclusively by the job coordinator during execution; the log text
/// is append-only and every status change goes through one of the transition
/// helpers below so status and logs can never drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Store-assigned identifier
    pub id: RunRequestId,

    /// Who asked for the run
    pub requested_by: String,

    /// Target environment
    pub env_id: EnvironmentId,

    /// Ordered batch of test files to execute
    pub file_paths: Vec<FilePathId>,

    /// Current status
    pub status: RunStatus,

    /// Accumulated log text, append-only
    pub logs: String,

    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl RunRequest {
    /// Create a new pending request
    pub fn new(
        id: RunRequestId,
        requested_by: impl Into<String>,
        env_id: EnvironmentId,
        file_paths: Vec<FilePathId>,
    ) -> Self {
        Self {
            id,
            requested_by: requested_by.into(),
            env_id,
            file_paths,
            status: RunStatus::Pending,
            logs: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Append one line to the logs, preceded by a newline
    pub fn append_log(&mut self, line: &str) {
        self.logs.push('\n');
        self.logs.push_str(line);
    }

    /// Mark the request as running
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
    }

    /// Mark the request as succeeded, appending the captured output
    pub fn complete(&mut self, output: &str) {
        self.status = RunStatus::Success;
        self.append_log(output);
    }

    /// Mark the request as failed, appending the captured output
    pub fn fail(&mut self, output: &str) {
        self.status = RunStatus::Failed;
        self.append_log(output);
    }

    /// Mark the request as waiting for a scheduled re-attempt
    pub fn mark_retrying(&mut self, message: &str) {
        self.status = RunStatus::Retrying;
        self.append_log(message);
    }

    /// Mark the request as permanently unable to start
    pub fn mark_failed_to_start(&mut self, message: &str) {
        self.status = RunStatus::FailedToStart;
        self.append_log(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RunRequest {
        RunRequest::new(
            RunRequestId(1),
            "Ramadan",
            EnvironmentId(1),
            vec![FilePathId(1), FilePathId(2)],
        )
    }

    #[test]
    fn test_status_names() {
        assert_eq!(RunStatus::Pending.as_str(), "PENDING");
        assert_eq!(RunStatus::Retrying.as_str(), "RETRYING");
        assert_eq!(RunStatus::Running.as_str(), "RUNNING");
        assert_eq!(RunStatus::Success.as_str(), "SUCCESS");
        assert_eq!(RunStatus::Failed.as_str(), "FAILED");
        assert_eq!(RunStatus::FailedToStart.as_str(), "FAILED_TO_START");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RunStatus::Success.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::FailedToStart.is_terminal());
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Retrying.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn test_new_request_is_pending() {
        let req = request();
        assert_eq!(req.status, RunStatus::Pending);
        assert!(req.logs.is_empty());
        assert_eq!(req.file_paths.len(), 2);
    }

    #[test]
    fn test_logs_are_append_only() {
        let mut req = request();
        req.append_log("first");
        req.append_log("second");
        assert_eq!(req.logs, "\nfirst\nsecond");
    }

    #[test]
    fn test_lifecycle_success() {
        let mut req = request();
        req.start();
        assert_eq!(req.status, RunStatus::Running);
        req.complete("all tests passed");
        assert_eq!(req.status, RunStatus::Success);
        assert_eq!(req.logs, "\nall tests passed");
    }

    #[test]
    fn test_lifecycle_retry_then_exhaustion() {
        let mut req = request();
        req.mark_retrying("Failed to run tests on env my_env retrying in 1 seconds.");
        assert_eq!(req.status, RunStatus::Retrying);
        req.mark_failed_to_start("Failed to run tests on env my_env after retrying 10 times.");
        assert_eq!(req.status, RunStatus::FailedToStart);
        assert!(req
            .logs
            .ends_with("Failed to run tests on env my_env after retrying 10 times."));
    }
}
