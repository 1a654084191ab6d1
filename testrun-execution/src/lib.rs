//! Testrun Execution Engine
//!
//! This crate provides the core execution functionality for Testrun: the
//! [`ProcessRunner`] that executes a batch of test files as one external
//! process with a hard wall-clock timeout, the [`JobCoordinator`] that drives
//! a run request through its status state machine while holding an exclusive
//! environment claim, and the [`TokioScheduler`] in-process implementation of
//! the scheduler boundary.

pub mod coordinator;
pub mod error;
pub mod runner;
pub mod scheduler;

// Re-export main types
pub use coordinator::JobCoordinator;
pub use error::ExecutionError;
pub use runner::{ProcessRunner, RunOutcome};
pub use scheduler::{run_dispatch_loop, QueuedRun, TokioScheduler};
