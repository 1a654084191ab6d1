//! # Testrun Interfaces
//!
//! Core interfaces and traits shared across the Testrun workspace.
//!
//! This crate is the neutral ground between the job coordinator and its
//! collaborators: the backing store (repositories with an atomic conditional
//! update for environment claims) and the scheduler (asynchronous, possibly
//! delayed re-invocation of the coordinator). Implementations live in
//! `testrun-storage` and `testrun-execution`; the coordinator depends only on
//! the traits defined here.

pub mod database;
pub mod scheduler;

// Re-export commonly used types
pub use database::{
    EnvironmentRepository, FilePathRepository, Repository, RepositoryFactory,
    RunRequestRepository, StoreError,
};
pub use scheduler::{Scheduler, SchedulerError};
