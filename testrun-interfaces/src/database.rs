//! Store repository interfaces
//!
//! These traits define the contracts the job coordinator needs from the
//! backing store. They enable dependency injection and testing through
//! interface segregation: the coordinator never touches a concrete store,
//! only these traits. The one hard requirement is the atomic conditional
//! update behind [`EnvironmentRepository::try_claim`].

use async_trait::async_trait;

use testrun_core::{
    Environment, EnvironmentId, FilePathId, RunRequest, RunRequestId, RunStatus, TestFilePath,
};

/// Common store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {message}")]
    Constraint { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Internal store error: {message}")]
    Internal { message: String },
}

impl StoreError {
    /// Convenience constructor for a missing entity
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Base repository trait with health check capability
#[async_trait]
pub trait Repository: Send + Sync {
    /// Check if the repository is healthy and can serve requests
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Run request repository interface
#[async_trait]
pub trait RunRequestRepository: Repository {
    /// Create a new pending request together with its file-path links.
    ///
    /// Creation is all-or-nothing: if any referenced file path or the target
    /// environment does not exist, nothing is persisted and a `Constraint`
    /// error is returned.
    async fn create(
        &self,
        requested_by: &str,
        env_id: EnvironmentId,
        file_paths: Vec<FilePathId>,
    ) -> Result<RunRequest, StoreError>;

    /// Find a request by ID
    async fn find_by_id(&self, id: RunRequestId) -> Result<Option<RunRequest>, StoreError>;

    /// Find requests by status
    async fn find_by_status(&self, status: RunStatus) -> Result<Vec<RunRequest>, StoreError>;

    /// Persist the current status and logs of a request
    async fn update(&self, request: &RunRequest) -> Result<(), StoreError>;
}

/// Environment repository interface
///
/// `try_claim` and `release` are the environment lock store: the check-and-set
/// in `try_claim` must be indivisible with respect to all concurrent claim
/// attempts on the same environment id (a row-level lock or compare-and-swap,
/// never a read followed by a separate write).
#[async_trait]
pub trait EnvironmentRepository: Repository {
    /// Create a new free environment
    async fn create(&self, name: &str) -> Result<Environment, StoreError>;

    /// Find an environment by ID
    async fn find_by_id(&self, id: EnvironmentId) -> Result<Option<Environment>, StoreError>;

    /// Atomically claim the environment if it is free.
    ///
    /// Returns `true` and sets the status to BUSY when the environment was
    /// FREE; returns `false` and changes nothing when it was already BUSY.
    async fn try_claim(&self, id: EnvironmentId) -> Result<bool, StoreError>;

    /// Release the environment back to FREE unconditionally.
    ///
    /// Idempotent: releasing an already-FREE environment is a no-op, not an
    /// error. Only an unknown id is reported as `NotFound`.
    async fn release(&self, id: EnvironmentId) -> Result<(), StoreError>;
}

/// Test file path repository interface
#[async_trait]
pub trait FilePathRepository: Repository {
    /// Create a new file path record
    async fn create(&self, path: &str) -> Result<TestFilePath, StoreError>;

    /// Find a file path by ID
    async fn find_by_id(&self, id: FilePathId) -> Result<Option<TestFilePath>, StoreError>;

    /// Resolve a batch of ids, preserving the given order.
    ///
    /// Fails with `NotFound` if any id is unknown.
    async fn find_many(&self, ids: &[FilePathId]) -> Result<Vec<TestFilePath>, StoreError>;
}

/// Factory trait for accessing repository instances
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Get run request repository instance
    fn run_requests(&self) -> &dyn RunRequestRepository;

    /// Get environment repository instance
    fn environments(&self) -> &dyn EnvironmentRepository;

    /// Get file path repository instance
    fn file_paths(&self) -> &dyn FilePathRepository;

    /// Check health of all repositories
    async fn health_check(&self) -> Result<(), StoreError>;
}
