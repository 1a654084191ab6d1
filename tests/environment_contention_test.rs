//! Mutual exclusion on the environment claim: no two run requests may hold
//! the same environment at once, and the environment always ends up free.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use testrun_config::ExecutionConfig;
use testrun_core::{EnvironmentStatus, RunRequestId, RunStatus};
use testrun_interfaces::{
    EnvironmentRepository, FilePathRepository, RunRequestRepository, Scheduler, SchedulerError,
};
use testrun_execution::JobCoordinator;
use testrun_storage::InMemoryStore;

/// Scheduler double that records enqueues instead of re-dispatching
#[derive(Default)]
struct RecordingScheduler {
    enqueued: Mutex<Vec<(RunRequestId, u32, Duration)>>,
}

#[async_trait::async_trait]
impl Scheduler for RecordingScheduler {
    async fn enqueue(
        &self,
        request_id: RunRequestId,
        attempt: u32,
        delay: Duration,
    ) -> Result<(), SchedulerError> {
        self.enqueued
            .lock()
            .unwrap()
            .push((request_id, attempt, delay));
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_double_book() -> Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    // Each run holds the environment for a second, long enough that every
    // losing claim attempt happens while the winner is still running
    let config = ExecutionConfig {
        program: "sleep".to_string(),
        ..Default::default()
    };
    let coordinator = Arc::new(JobCoordinator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        scheduler.clone(),
        &config,
    ));

    let env = EnvironmentRepository::create(store.as_ref(), "contended").await?;
    let hold = FilePathRepository::create(store.as_ref(), "1").await?;

    let mut requests = Vec::new();
    for i in 0..8 {
        let request = RunRequestRepository::create(
            store.as_ref(),
            &format!("requester-{}", i),
            env.id,
            vec![hold.id],
        )
        .await?;
        requests.push(request.id);
    }

    let mut handles = Vec::new();
    for &id in &requests {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move { coordinator.execute(id, 0).await }));
    }
    for handle in handles {
        handle.await??;
    }

    let mut successes = 0;
    let mut retrying = 0;
    for &id in &requests {
        let request = RunRequestRepository::find_by_id(store.as_ref(), id)
            .await?
            .expect("request exists");
        match request.status {
            RunStatus::Success => successes += 1,
            RunStatus::Retrying => retrying += 1,
            other => panic!("unexpected status {} for request {}", other, id),
        }
    }

    // Exactly one run claimed the environment; everyone else backed off
    assert_eq!(successes, 1);
    assert_eq!(retrying, 7);
    assert_eq!(scheduler.enqueued.lock().unwrap().len(), 7);

    let env = EnvironmentRepository::find_by_id(store.as_ref(), env.id)
        .await?
        .expect("env exists");
    assert_eq!(env.status, EnvironmentStatus::Free);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_delivery_is_safe() -> Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let config = ExecutionConfig {
        program: "echo".to_string(),
        ..Default::default()
    };
    let coordinator = Arc::new(JobCoordinator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        scheduler.clone(),
        &config,
    ));

    let env = EnvironmentRepository::create(store.as_ref(), "my_env").await?;
    let path = FilePathRepository::create(store.as_ref(), "path1").await?;
    let request =
        RunRequestRepository::create(store.as_ref(), "Ramadan", env.id, vec![path.id]).await?;

    // At-least-once delivery: the same request id arriving twice simply runs
    // twice, each run claiming and releasing the environment in turn
    coordinator.execute(request.id, 0).await?;
    coordinator.execute(request.id, 0).await?;

    let finished = RunRequestRepository::find_by_id(store.as_ref(), request.id)
        .await?
        .expect("request exists");
    assert_eq!(finished.status, RunStatus::Success);
    assert!(scheduler.enqueued.lock().unwrap().is_empty());

    let env = EnvironmentRepository::find_by_id(store.as_ref(), env.id)
        .await?
        .expect("env exists");
    assert_eq!(env.status, EnvironmentStatus::Free);
    Ok(())
}
