//! In-memory repository implementations
//!
//! The store keeps one mutex per entity table. Claim and release of an
//! environment do their check-and-set entirely under the environments mutex,
//! which is what makes `try_claim` indivisible with respect to concurrent
//! claim attempts, the in-memory equivalent of a row-level conditional
//! update. No lock is ever held across an await point.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::debug;

use testrun_core::{
    Environment, EnvironmentId, EnvironmentStatus, FilePathId, RunRequest, RunRequestId,
    RunStatus, TestFilePath,
};
use testrun_interfaces::{
    EnvironmentRepository, FilePathRepository, Repository, RepositoryFactory,
    RunRequestRepository, StoreError,
};

/// In-memory backing store implementing every repository interface
#[derive(Debug, Default)]
pub struct InMemoryStore {
    requests: Mutex<HashMap<RunRequestId, RunRequest>>,
    environments: Mutex<HashMap<EnvironmentId, Environment>>,
    file_paths: Mutex<HashMap<FilePathId, TestFilePath>>,
    next_request_id: AtomicI32,
    next_environment_id: AtomicI32,
    next_file_path_id: AtomicI32,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(counter: &AtomicI32) -> i32 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl Repository for InMemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl RunRequestRepository for InMemoryStore {
    async fn create(
        &self,
        requested_by: &str,
        env_id: EnvironmentId,
        file_paths: Vec<FilePathId>,
    ) -> Result<RunRequest, StoreError> {
        if !self.environments.lock().contains_key(&env_id) {
            return Err(StoreError::Constraint {
                message: format!("unknown environment {}", env_id),
            });
        }

        {
            let paths = self.file_paths.lock();
            for id in &file_paths {
                if !paths.contains_key(id) {
                    // Nothing has been written yet, so the request and its
                    // links either both persist or neither does.
                    return Err(StoreError::Constraint {
                        message: format!("unknown file path {}", id),
                    });
                }
            }
        }

        let id = RunRequestId(Self::next_id(&self.next_request_id));
        let request = RunRequest::new(id, requested_by, env_id, file_paths);
        self.requests.lock().insert(id, request.clone());
        debug!("Created run request {} for env {}", id, env_id);
        Ok(request)
    }

    async fn find_by_id(&self, id: RunRequestId) -> Result<Option<RunRequest>, StoreError> {
        Ok(self.requests.lock().get(&id).cloned())
    }

    async fn find_by_status(&self, status: RunStatus) -> Result<Vec<RunRequest>, StoreError> {
        let requests = self.requests.lock();
        let mut matching: Vec<RunRequest> = requests
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id.0);
        Ok(matching)
    }

    async fn update(&self, request: &RunRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.lock();
        match requests.get_mut(&request.id) {
            Some(stored) => {
                *stored = request.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("run request", request.id)),
        }
    }
}

#[async_trait]
impl EnvironmentRepository for InMemoryStore {
    async fn create(&self, name: &str) -> Result<Environment, StoreError> {
        let id = EnvironmentId(Self::next_id(&self.next_environment_id));
        let env = Environment::new(id, name);
        self.environments.lock().insert(id, env.clone());
        Ok(env)
    }

    async fn find_by_id(&self, id: EnvironmentId) -> Result<Option<Environment>, StoreError> {
        Ok(self.environments.lock().get(&id).cloned())
    }

    async fn try_claim(&self, id: EnvironmentId) -> Result<bool, StoreError> {
        let mut environments = self.environments.lock();
        let env = environments
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("environment", id))?;

        if env.status == EnvironmentStatus::Free {
            env.status = EnvironmentStatus::Busy;
            debug!("Claimed env {} ({})", id, env.name);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn release(&self, id: EnvironmentId) -> Result<(), StoreError> {
        let mut environments = self.environments.lock();
        let env = environments
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("environment", id))?;

        env.status = EnvironmentStatus::Free;
        debug!("Released env {} ({})", id, env.name);
        Ok(())
    }
}

#[async_trait]
impl FilePathRepository for InMemoryStore {
    async fn create(&self, path: &str) -> Result<TestFilePath, StoreError> {
        let id = FilePathId(Self::next_id(&self.next_file_path_id));
        let file_path = TestFilePath::new(id, path);
        self.file_paths.lock().insert(id, file_path.clone());
        Ok(file_path)
    }

    async fn find_by_id(&self, id: FilePathId) -> Result<Option<TestFilePath>, StoreError> {
        Ok(self.file_paths.lock().get(&id).cloned())
    }

    async fn find_many(&self, ids: &[FilePathId]) -> Result<Vec<TestFilePath>, StoreError> {
        let paths = self.file_paths.lock();
        ids.iter()
            .map(|id| {
                paths
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found("file path", id))
            })
            .collect()
    }
}

#[async_trait]
impl RepositoryFactory for InMemoryStore {
    fn run_requests(&self) -> &dyn RunRequestRepository {
        self
    }

    fn environments(&self) -> &dyn EnvironmentRepository {
        self
    }

    fn file_paths(&self) -> &dyn FilePathRepository {
        self
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Repository::health_check(self).await
    }
}
