//! Inspection repository trait.
//!
//! Inspection schedules are upserted idempotently, keyed by
//! (project, phase). Manual overrides (`auto_scheduled == false`) are
//! authoritative and never overwritten by engine-produced entries.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::{InspectionSchedule, ProjectId};
use crate::models::Phase;

/// Repository trait for inspection schedule persistence.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait InspectionRepository: Send + Sync {
    /// Upsert inspection schedules keyed by (project, phase).
    ///
    /// An engine-produced entry replaces a prior auto-scheduled row but
    /// never a manual override.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows written
    async fn upsert_inspections(
        &self,
        project_id: &ProjectId,
        inspections: &[InspectionSchedule],
    ) -> RepositoryResult<usize>;

    /// Fetch all inspection schedules for a project.
    async fn fetch_inspections(
        &self,
        project_id: &ProjectId,
    ) -> RepositoryResult<Vec<InspectionSchedule>>;

    /// Record a manual inspection date for a phase.
    ///
    /// The stored row is marked `auto_scheduled = false` and the engine
    /// treats it as authoritative on subsequent runs.
    ///
    /// # Returns
    /// * `Ok(InspectionSchedule)` - The stored override
    /// * `Err(RepositoryError)` - If the phase mandates no inspection
    async fn set_manual_inspection_date(
        &self,
        project_id: &ProjectId,
        phase: Phase,
        date: NaiveDate,
    ) -> RepositoryResult<InspectionSchedule>;
}
