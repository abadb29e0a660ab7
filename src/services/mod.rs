//! Service layer for serpwatch business logic.
//!
//! This module contains domain logic separated from UI concerns.
//! Services can be used by the CLI, the scheduler, or other interfaces.

pub mod error;
pub mod run;
pub mod tags;

pub use error::ServiceError;
pub use run::{RunOrchestrator, RunOutcome, RunStats};
pub use tags::{FetchOutcome, HttpPageFetcher, PageFetcher, TagReconciler};
