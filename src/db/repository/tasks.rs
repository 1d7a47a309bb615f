//! Task repository trait.
//!
//! Tasks are owned by the caller and stored as per-project snapshots; the
//! engine only ever reads them.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::ProjectId;
use crate::models::Task;

/// Repository trait for task snapshot storage.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Replace the stored task snapshot for a project.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of tasks stored
    /// * `Err(RepositoryError)` - If a task belongs to a different project
    async fn store_tasks(&self, project_id: &ProjectId, tasks: Vec<Task>)
        -> RepositoryResult<usize>;

    /// Fetch the task snapshot for a project. Unknown projects yield an
    /// empty list, not an error.
    async fn fetch_tasks(&self, project_id: &ProjectId) -> RepositoryResult<Vec<Task>>;

    /// List every project with a stored snapshot.
    async fn list_projects(&self) -> RepositoryResult<Vec<ProjectId>>;
}
