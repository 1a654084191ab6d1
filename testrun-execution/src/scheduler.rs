//! In-process scheduler built on tokio
//!
//! Work items flow through an unbounded mpsc channel; a delayed enqueue is a
//! spawned task that sleeps and then sends, so a pending retry never blocks
//! a thread. The dispatch loop spawns one coordinator invocation per
//! delivered item, which is what allows runs against different environments
//! to proceed in parallel.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, warn};

use testrun_core::RunRequestId;
use testrun_interfaces::{Scheduler, SchedulerError};

use crate::coordinator::JobCoordinator;

/// One unit of coordinator work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedRun {
    pub request_id: RunRequestId,
    pub attempt: u32,
}

/// Scheduler implementation delivering work items over an mpsc channel
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<QueuedRun>,
}

impl TokioScheduler {
    /// Create a scheduler and the receiving end for the dispatch loop
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueuedRun>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn enqueue(
        &self,
        request_id: RunRequestId,
        attempt: u32,
        delay: Duration,
    ) -> Result<(), SchedulerError> {
        let item = QueuedRun {
            request_id,
            attempt,
        };

        if delay.is_zero() {
            return self.tx.send(item).map_err(|_| SchedulerError::QueueClosed);
        }

        let tx = self.tx.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            if tx.send(item).is_err() {
                warn!(
                    "Dropping scheduled run for request {}: queue closed",
                    item.request_id
                );
            }
        });
        Ok(())
    }
}

/// Consume queued runs until the channel closes, spawning one coordinator
/// invocation per item
pub async fn run_dispatch_loop(
    coordinator: Arc<JobCoordinator>,
    mut queue: mpsc::UnboundedReceiver<QueuedRun>,
) {
    while let Some(item) = queue.recv().await {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.execute(item.request_id, item.attempt).await {
                error!(
                    "Run request {} attempt {} failed: {}",
                    item.request_id, item.attempt, e
                );
            }
        });
    }
}
