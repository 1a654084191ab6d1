//! Core domain models and types for Testrun
//!
//! This crate contains the fundamental types used throughout the Testrun
//! system. It has minimal dependencies and defines the domain language of
//! the application: run requests, execution environments, and the test file
//! paths a request runs.

pub mod environment;
pub mod file_path;
pub mod request;

// Re-export commonly used types at the crate root
pub use environment::{Environment, EnvironmentId, EnvironmentStatus};
pub use file_path::{FilePathId, TestFilePath};
pub use request::{RunRequest, RunRequestId, RunStatus};
