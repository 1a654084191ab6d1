//! Job coordinator: drives one run request through its state machine
//!
//! One `execute` call handles one attempt for one request: claim the target
//! environment, run the test process and record the outcome, then release
//! the claim; or, when the environment is busy, hand the request to the
//! retry policy. The environment claim is the only cross-task serialization
//! point: while a coordinator holds it, no other invocation can reach the
//! running state for that environment, so request mutation during a run
//! needs no further locking.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use testrun_config::ExecutionConfig;
use testrun_core::{Environment, RunRequest, RunRequestId};
use testrun_interfaces::{
    EnvironmentRepository, FilePathRepository, RunRequestRepository, Scheduler,
};
use testrun_resilience::RetryPolicy;

use crate::error::ExecutionError;
use crate::runner::ProcessRunner;

/// Coordinates environment claims, process runs, and contention retries
pub struct JobCoordinator {
    requests: Arc<dyn RunRequestRepository>,
    environments: Arc<dyn EnvironmentRepository>,
    file_paths: Arc<dyn FilePathRepository>,
    scheduler: Arc<dyn Scheduler>,
    runner: ProcessRunner,
    retry_policy: RetryPolicy,
    run_timeout: Duration,
}

impl JobCoordinator {
    /// Create a coordinator wired to the given collaborators
    pub fn new(
        requests: Arc<dyn RunRequestRepository>,
        environments: Arc<dyn EnvironmentRepository>,
        file_paths: Arc<dyn FilePathRepository>,
        scheduler: Arc<dyn Scheduler>,
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            requests,
            environments,
            file_paths,
            scheduler,
            runner: ProcessRunner::new(config),
            retry_policy: RetryPolicy::new(config.max_retry),
            run_timeout: config.test_run_timeout,
        }
    }

    /// Execute one attempt for the given request.
    ///
    /// Safe to re-enter: a duplicate delivery either finds the environment
    /// busy and goes down the retry path, or runs again after the first
    /// invocation released its claim.
    pub async fn execute(&self, request_id: RunRequestId, attempt: u32) -> Result<(), ExecutionError> {
        let mut request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(ExecutionError::RequestNotFound(request_id))?;

        let env = self
            .environments
            .find_by_id(request.env_id)
            .await?
            .ok_or(ExecutionError::EnvironmentNotFound(request.env_id))?;

        if !self.environments.try_claim(env.id).await? {
            debug!("Env {} busy for request {}, attempt {}", env.name, request_id, attempt);
            return self.handle_retry(&mut request, &env, attempt).await;
        }

        // Everything done under the claim is one fallible block; the release
        // below runs exactly once on every exit path out of it.
        let run = self.run_claimed(&mut request, &env).await;
        self.environments.release(env.id).await?;
        run
    }

    /// Run the test process while holding the environment claim
    async fn run_claimed(
        &self,
        request: &mut RunRequest,
        env: &Environment,
    ) -> Result<(), ExecutionError> {
        // Resolve the batch before going RUNNING so a store failure here
        // leaves the request re-runnable instead of stuck mid-flight
        let file_paths = self.file_paths.find_many(&request.file_paths).await?;
        let batch: Vec<String> = file_paths.into_iter().map(|p| p.path).collect();

        request.start();
        self.requests.update(request).await?;
        info!("Run request {} running on env {}", request.id, env.name);

        let outcome = self.runner.run(&batch, self.run_timeout).await;
        if outcome.success() {
            request.complete(&outcome.output);
            info!("Run request {} succeeded on env {}", request.id, env.name);
        } else {
            request.fail(&outcome.output);
            warn!(
                "Run request {} failed on env {} (exit code {:?}, timed out: {})",
                request.id, env.name, outcome.exit_code, outcome.timed_out
            );
        }
        self.requests.update(request).await?;

        Ok(())
    }

    /// Handle a contended claim: back off and reschedule, or give up once
    /// the attempt budget is spent
    pub async fn handle_retry(
        &self,
        request: &mut RunRequest,
        env: &Environment,
        attempt: u32,
    ) -> Result<(), ExecutionError> {
        if self.retry_policy.is_exhausted(attempt) {
            request.mark_failed_to_start(&format!(
                "Failed to run tests on env {} after retrying {} times.",
                env.name, self.retry_policy.max_retry
            ));
            self.requests.update(request).await?;
            warn!(
                "Run request {} failed to start after {} attempts",
                request.id, attempt
            );
            return Ok(());
        }

        let delay = self.retry_policy.delay_for_attempt(attempt);
        request.mark_retrying(&format!(
            "Failed to run tests on env {} retrying in {} seconds.",
            env.name,
            delay.as_secs()
        ));
        self.requests.update(request).await?;
        self.scheduler.enqueue(request.id, attempt + 1, delay).await?;
        debug!(
            "Run request {} rescheduled at attempt {} in {}s",
            request.id,
            attempt + 1,
            delay.as_secs()
        );

        Ok(())
    }
}
