//! Error types for test run execution

use thiserror::Error;

use testrun_core::{EnvironmentId, RunRequestId};
use testrun_interfaces::{SchedulerError, StoreError};

/// Test run execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Run request not found: {0}")]
    RequestNotFound(RunRequestId),

    #[error("Environment not found: {0}")]
    EnvironmentNotFound(EnvironmentId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}
