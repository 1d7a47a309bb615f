//! Conflict repository trait.
//!
//! Conflicts are keyed by their stable signature (type + sorted affected
//! task ids). They are never deleted; resolution flips their status, and
//! resolution is idempotent under concurrent callers.

use std::collections::HashSet;

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{ProjectId, ScheduleConflict};

/// Repository trait for schedule conflict persistence.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ConflictRepository: Send + Sync {
    /// Upsert conflicts by signature.
    ///
    /// New signatures are inserted as open; rows for already-known
    /// signatures keep their existing resolution status (a detection run
    /// never re-opens a resolved conflict).
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of newly inserted conflicts
    async fn upsert_conflicts(&self, conflicts: &[ScheduleConflict]) -> RepositoryResult<usize>;

    /// Fetch all stored conflicts for a project, open and resolved.
    async fn fetch_conflicts(&self, project_id: &ProjectId)
        -> RepositoryResult<Vec<ScheduleConflict>>;

    /// Signatures of conflicts marked resolved for a project.
    async fn resolved_signatures(&self, project_id: &ProjectId)
        -> RepositoryResult<HashSet<String>>;

    /// Atomically mark a conflict resolved by signature.
    ///
    /// # Returns
    /// * `Ok(true)` - The conflict transitioned from open to resolved
    /// * `Ok(false)` - It was already resolved (silent no-op)
    /// * `Err(RepositoryError)` - Unknown signature
    async fn resolve_conflict(&self, signature: &str) -> RepositoryResult<bool>;
}
