//! Scheduler interface for asynchronous coordinator re-invocation
//!
//! The scheduler is the mechanism that invokes the job coordinator for a
//! given request id, now or after a delay. The coordinator only ever emits
//! work items through this trait; the waiting happens inside the scheduler
//! implementation as a scheduled task, never as a blocked thread inside the
//! coordinator. Delivery is at-least-once: `execute` is safe to re-enter,
//! so a duplicate delivery is harmless.

use async_trait::async_trait;
use std::time::Duration;

use testrun_core::RunRequestId;

/// Error types for scheduler operations
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler queue is closed")]
    QueueClosed,

    #[error("Internal scheduler error: {0}")]
    Internal(String),
}

/// Work-queue boundary with delayed delivery
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Enqueue an `execute(request_id, attempt)` invocation, optionally
    /// delayed. A zero delay means "as soon as possible".
    async fn enqueue(
        &self,
        request_id: RunRequestId,
        attempt: u32,
        delay: Duration,
    ) -> Result<(), SchedulerError>;
}
