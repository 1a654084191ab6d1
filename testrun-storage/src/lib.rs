//! Storage layer for Testrun
//!
//! Provides the in-memory reference implementation of the repository
//! interfaces (including the atomic environment claim the coordinator
//! depends on) and the upload store for submitted test files. A durable
//! backend would implement the same `testrun-interfaces` traits; everything
//! above the traits is unaware of which store it is talking to.

pub mod memory;
pub mod uploads;

pub use memory::InMemoryStore;
pub use uploads::{UploadError, UploadStore};
