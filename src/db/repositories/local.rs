//! In-memory repository implementation.
//!
//! Backs unit tests and local development. All state lives in
//! `parking_lot` locks; guards are dropped before any await point so the
//! futures stay `Send`.

use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::api::{InspectionId, InspectionSchedule, ProjectId, ResolutionStatus, ScheduleConflict};
use crate::db::repository::{
    ConflictRepository, ErrorContext, FullRepository, InspectionRepository, RepositoryError,
    RepositoryResult, TaskRepository,
};
use crate::models::{Phase, PhaseOrderingRules, Task, TaskStatus};

/// In-memory implementation of the repository traits.
///
/// Conflicts are keyed by signature, inspections by (project, phase).
pub struct LocalRepository {
    rules: PhaseOrderingRules,
    tasks: RwLock<HashMap<ProjectId, Vec<Task>>>,
    conflicts: RwLock<HashMap<String, ScheduleConflict>>,
    inspections: RwLock<HashMap<(ProjectId, Phase), InspectionSchedule>>,
}

impl LocalRepository {
    /// Create an empty repository with the standard rule table.
    pub fn new() -> Self {
        Self::with_rules(PhaseOrderingRules::standard())
    }

    /// Create an empty repository with an explicit rule table.
    ///
    /// The rules are only consulted to reject manual inspection dates for
    /// phases that mandate no inspection.
    pub fn with_rules(rules: PhaseOrderingRules) -> Self {
        Self {
            rules,
            tasks: RwLock::new(HashMap::new()),
            conflicts: RwLock::new(HashMap::new()),
            inspections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored conflicts, open and resolved. Test helper.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.read().len()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for LocalRepository {
    async fn store_tasks(
        &self,
        project_id: &ProjectId,
        tasks: Vec<Task>,
    ) -> RepositoryResult<usize> {
        if let Some(stray) = tasks.iter().find(|t| &t.project_id != project_id) {
            return Err(RepositoryError::ValidationError {
                message: format!(
                    "task {} belongs to project {}, not {}",
                    stray.id, stray.project_id, project_id
                ),
                context: ErrorContext::new("store_tasks")
                    .with_entity("task")
                    .with_entity_id(&stray.id),
            });
        }

        let count = tasks.len();
        self.tasks.write().insert(project_id.clone(), tasks);
        Ok(count)
    }

    async fn fetch_tasks(&self, project_id: &ProjectId) -> RepositoryResult<Vec<Task>> {
        Ok(self
            .tasks
            .read()
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_projects(&self) -> RepositoryResult<Vec<ProjectId>> {
        let mut projects: Vec<ProjectId> = self.tasks.read().keys().cloned().collect();
        projects.sort();
        Ok(projects)
    }
}

#[async_trait]
impl ConflictRepository for LocalRepository {
    async fn upsert_conflicts(&self, conflicts: &[ScheduleConflict]) -> RepositoryResult<usize> {
        let mut store = self.conflicts.write();
        let mut inserted = 0;
        for conflict in conflicts {
            let signature = conflict.signature();
            // Known signatures keep their stored row; resolved stays resolved.
            store.entry(signature).or_insert_with(|| {
                inserted += 1;
                conflict.clone()
            });
        }
        Ok(inserted)
    }

    async fn fetch_conflicts(
        &self,
        project_id: &ProjectId,
    ) -> RepositoryResult<Vec<ScheduleConflict>> {
        let mut found: Vec<ScheduleConflict> = self
            .conflicts
            .read()
            .values()
            .filter(|c| &c.project_id == project_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.description.cmp(&b.description));
        Ok(found)
    }

    async fn resolved_signatures(
        &self,
        project_id: &ProjectId,
    ) -> RepositoryResult<HashSet<String>> {
        Ok(self
            .conflicts
            .read()
            .iter()
            .filter(|(_, c)| {
                &c.project_id == project_id && c.resolution_status == ResolutionStatus::Resolved
            })
            .map(|(signature, _)| signature.clone())
            .collect())
    }

    async fn resolve_conflict(&self, signature: &str) -> RepositoryResult<bool> {
        let mut store = self.conflicts.write();
        let conflict = store.get_mut(signature).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("no conflict with signature {}", signature),
                ErrorContext::new("resolve_conflict")
                    .with_entity("conflict")
                    .with_entity_id(signature),
            )
        })?;

        if conflict.resolution_status == ResolutionStatus::Resolved {
            return Ok(false);
        }
        conflict.resolution_status = ResolutionStatus::Resolved;
        Ok(true)
    }
}

#[async_trait]
impl InspectionRepository for LocalRepository {
    async fn upsert_inspections(
        &self,
        project_id: &ProjectId,
        inspections: &[InspectionSchedule],
    ) -> RepositoryResult<usize> {
        let mut store = self.inspections.write();
        let mut written = 0;
        for schedule in inspections {
            let key = (project_id.clone(), schedule.required_for_phase);
            // Manual overrides are authoritative; engine output never
            // replaces them.
            if let Some(existing) = store.get(&key) {
                if !existing.auto_scheduled && schedule.auto_scheduled {
                    continue;
                }
            }
            store.insert(key, schedule.clone());
            written += 1;
        }
        Ok(written)
    }

    async fn fetch_inspections(
        &self,
        project_id: &ProjectId,
    ) -> RepositoryResult<Vec<InspectionSchedule>> {
        let mut found: Vec<InspectionSchedule> = self
            .inspections
            .read()
            .iter()
            .filter(|((project, _), _)| project == project_id)
            .map(|(_, schedule)| schedule.clone())
            .collect();
        found.sort_by_key(|s| s.required_for_phase);
        Ok(found)
    }

    async fn set_manual_inspection_date(
        &self,
        project_id: &ProjectId,
        phase: Phase,
        date: NaiveDate,
    ) -> RepositoryResult<InspectionSchedule> {
        let inspection_type = self.rules.inspection_for(phase).ok_or_else(|| {
            RepositoryError::ValidationError {
                message: format!("phase {} mandates no inspection", phase),
                context: ErrorContext::new("set_manual_inspection_date")
                    .with_entity("inspection")
                    .with_entity_id(phase),
            }
        })?;

        let prerequisites_met = {
            let tasks = self.tasks.read();
            tasks
                .get(project_id)
                .map(|list| {
                    let phase_tasks: Vec<_> =
                        list.iter().filter(|t| t.phase == phase).collect();
                    !phase_tasks.is_empty()
                        && phase_tasks.iter().all(|t| t.status == TaskStatus::Completed)
                })
                .unwrap_or(false)
        };

        let schedule = InspectionSchedule {
            id: InspectionId::generate(),
            project_id: project_id.clone(),
            inspection_type,
            required_for_phase: phase,
            optimal_date: date,
            prerequisites_met,
            auto_scheduled: false,
        };
        self.inspections
            .write()
            .insert((project_id.clone(), phase), schedule.clone());
        Ok(schedule)
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ConflictId, ConflictType, IssueSeverity, TaskId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, project: &str, phase: Phase) -> Task {
        Task {
            id: TaskId::new(id),
            name: id.to_string(),
            phase,
            start_date: Some(date(2025, 5, 1)),
            end_date: Some(date(2025, 5, 10)),
            status: TaskStatus::NotStarted,
            assigned_trade: None,
            inspection_required: false,
            project_id: ProjectId::new(project),
        }
    }

    fn conflict(project: &str, tasks: &[&str]) -> ScheduleConflict {
        ScheduleConflict {
            id: ConflictId::generate(),
            project_id: ProjectId::new(project),
            conflict_type: ConflictType::TradeOverlap,
            severity: IssueSeverity::High,
            affected_tasks: tasks.iter().map(|t| TaskId::new(*t)).collect(),
            description: format!("overlap between {:?}", tasks),
            suggested_resolution: "shift one task".to_string(),
            auto_resolvable: true,
            resolution_status: ResolutionStatus::Open,
        }
    }

    #[tokio::test]
    async fn test_store_and_fetch_tasks() {
        let repo = LocalRepository::new();
        let project = ProjectId::new("p1");
        let count = repo
            .store_tasks(&project, vec![task("t1", "p1", Phase::Framing)])
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(repo.fetch_tasks(&project).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_rejects_foreign_project() {
        let repo = LocalRepository::new();
        let err = repo
            .store_tasks(
                &ProjectId::new("p1"),
                vec![task("t1", "other", Phase::Framing)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_unknown_project_is_empty() {
        let repo = LocalRepository::new();
        assert!(repo
            .fetch_tasks(&ProjectId::new("nope"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_upsert_conflicts_idempotent() {
        let repo = LocalRepository::new();
        let c = conflict("p1", &["a", "b"]);
        assert_eq!(repo.upsert_conflicts(&[c.clone()]).await.unwrap(), 1);
        // Same signature, fresh id: no new row.
        let again = conflict("p1", &["a", "b"]);
        assert_eq!(repo.upsert_conflicts(&[again]).await.unwrap(), 0);
        assert_eq!(repo.conflict_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_conflict_transitions_once() {
        let repo = LocalRepository::new();
        let c = conflict("p1", &["a", "b"]);
        let signature = c.signature();
        repo.upsert_conflicts(&[c]).await.unwrap();

        assert!(repo.resolve_conflict(&signature).await.unwrap());
        assert!(!repo.resolve_conflict(&signature).await.unwrap());

        let resolved = repo
            .resolved_signatures(&ProjectId::new("p1"))
            .await
            .unwrap();
        assert!(resolved.contains(&signature));
    }

    #[tokio::test]
    async fn test_resolve_unknown_signature_fails() {
        let repo = LocalRepository::new();
        let err = repo.resolve_conflict("deadbeef").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolved_conflict_survives_reupsert() {
        let repo = LocalRepository::new();
        let c = conflict("p1", &["a", "b"]);
        let signature = c.signature();
        repo.upsert_conflicts(&[c]).await.unwrap();
        repo.resolve_conflict(&signature).await.unwrap();

        repo.upsert_conflicts(&[conflict("p1", &["a", "b"])])
            .await
            .unwrap();
        let stored = repo.fetch_conflicts(&ProjectId::new("p1")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].resolution_status, ResolutionStatus::Resolved);
    }

    #[tokio::test]
    async fn test_manual_inspection_survives_auto_upsert() {
        let repo = LocalRepository::new();
        let project = ProjectId::new("p1");
        let manual = repo
            .set_manual_inspection_date(&project, Phase::Foundation, date(2025, 6, 2))
            .await
            .unwrap();
        assert!(!manual.auto_scheduled);

        let auto = InspectionSchedule {
            id: InspectionId::generate(),
            project_id: project.clone(),
            inspection_type: crate::models::InspectionType::Foundation,
            required_for_phase: Phase::Foundation,
            optimal_date: date(2025, 6, 10),
            prerequisites_met: false,
            auto_scheduled: true,
        };
        repo.upsert_inspections(&project, &[auto]).await.unwrap();

        let stored = repo.fetch_inspections(&project).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].optimal_date, date(2025, 6, 2));
        assert!(!stored[0].auto_scheduled);
    }

    #[tokio::test]
    async fn test_manual_date_rejected_for_uninspected_phase() {
        let repo = LocalRepository::new();
        let err = repo
            .set_manual_inspection_date(&ProjectId::new("p1"), Phase::SitePrep, date(2025, 6, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_auto_upsert_replaces_auto() {
        let repo = LocalRepository::new();
        let project = ProjectId::new("p1");
        let mut first = InspectionSchedule {
            id: InspectionId::generate(),
            project_id: project.clone(),
            inspection_type: crate::models::InspectionType::Framing,
            required_for_phase: Phase::Framing,
            optimal_date: date(2025, 6, 10),
            prerequisites_met: false,
            auto_scheduled: true,
        };
        repo.upsert_inspections(&project, std::slice::from_ref(&first))
            .await
            .unwrap();

        first.optimal_date = date(2025, 6, 12);
        repo.upsert_inspections(&project, &[first]).await.unwrap();

        let stored = repo.fetch_inspections(&project).await.unwrap();
        assert_eq!(stored[0].optimal_date, date(2025, 6, 12));
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());
    }
}
