//! Repository traits for schedule data access.
//!
//! The persistence surface is split by concern: tasks, conflicts and
//! inspections each get their own trait, and [`FullRepository`] composes
//! the three for consumers that need everything (the engine facade, the
//! HTTP layer).

pub mod conflicts;
pub mod error;
pub mod inspections;
pub mod tasks;

pub use conflicts::ConflictRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use inspections::InspectionRepository;
pub use tasks::TaskRepository;

use async_trait::async_trait;

/// Combined repository trait for full data access.
#[async_trait]
pub trait FullRepository:
    TaskRepository + ConflictRepository + InspectionRepository + Send + Sync
{
    /// Check that the backing store is reachable.
    ///
    /// # Returns
    /// * `Ok(true)` - Store is healthy
    /// * `Err(RepositoryError)` - Store is unreachable
    async fn health_check(&self) -> RepositoryResult<bool>;
}
