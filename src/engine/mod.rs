//! Schedule intelligence engine.
//!
//! The engine runs four independent read-only analyses over an immutable
//! snapshot of a project's tasks:
//!
//! 1. Sequence validation ([`validator`]) - phase ordering and inspection
//!    prerequisites per task.
//! 2. Conflict detection ([`conflicts`]) - trade overlaps, sequence
//!    violations, inspection blocking.
//! 3. Inspection scheduling ([`inspections`]) - earliest valid regulatory
//!    inspection windows.
//! 4. Trade-sequencing optimization ([`optimizer`]) - critical path and
//!    overlap/buffer proposals.
//!
//! Each analysis is a pure function; [`ScheduleEngine`] wires the
//! persistence collaborator around them and fans the four out on blocking
//! workers when asked for a combined run. The engine never mutates task
//! records; it persists only conflict resolution state and inspection
//! schedules.

pub mod config;
pub mod conflicts;
pub mod inspections;
pub mod optimizer;
pub mod signature;
pub mod validator;

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;

use std::collections::HashSet;
use std::sync::Arc;

use log::{info, warn};

use crate::api::{
    InspectionSchedule, OptimizedSchedule, ProjectAnalysis, ProjectId, ScheduleConflict,
    ValidationResult,
};
use crate::db::repository::{
    ConflictRepository, FullRepository, InspectionRepository, RepositoryError, TaskRepository,
};
use crate::models::{PhaseOrderingRules, Task};

pub use config::EngineConfig;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine failure taxonomy.
///
/// Data-integrity problems (missing dates, unknown phases) are never
/// errors: they surface as validation issues and computation continues for
/// the remaining tasks.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The task dependency graph contains a cycle; the optimizer refuses to
    /// produce a silently wrong critical path.
    #[error("Dependency cycle detected among tasks: {tasks}")]
    GraphCycle { tasks: String },

    /// A combined analysis run exceeded its time budget.
    #[error("Analysis run exceeded the {budget_secs}s time budget")]
    Timeout { budget_secs: u64 },

    /// Configuration file missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Persistence collaborator failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A worker task panicked or was cancelled.
    #[error("Analysis worker failed: {0}")]
    Worker(String),
}

/// Immutable per-run snapshot of a project's data, fetched once up front.
#[derive(Debug, Clone)]
struct Snapshot {
    tasks: Vec<Task>,
    inspections: Vec<InspectionSchedule>,
    resolved: HashSet<String>,
}

/// The schedule intelligence engine facade.
///
/// Holds the persistence collaborator, the injected phase-ordering rule
/// table, and tuning configuration.
#[derive(Clone)]
pub struct ScheduleEngine {
    repo: Arc<dyn FullRepository>,
    rules: Arc<PhaseOrderingRules>,
    config: EngineConfig,
}

impl ScheduleEngine {
    /// Create an engine with explicit rules and configuration.
    pub fn new(
        repo: Arc<dyn FullRepository>,
        rules: PhaseOrderingRules,
        config: EngineConfig,
    ) -> Self {
        Self {
            repo,
            rules: Arc::new(rules),
            config,
        }
    }

    /// Create an engine with the standard rule table and default config.
    pub fn with_defaults(repo: Arc<dyn FullRepository>) -> Self {
        Self::new(repo, PhaseOrderingRules::standard(), EngineConfig::default())
    }

    pub fn rules(&self) -> &PhaseOrderingRules {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn snapshot(&self, project_id: &ProjectId) -> EngineResult<Snapshot> {
        let tasks = self.repo.fetch_tasks(project_id).await?;
        let inspections = self.repo.fetch_inspections(project_id).await?;
        let resolved = self.repo.resolved_signatures(project_id).await?;
        Ok(Snapshot {
            tasks,
            inspections,
            resolved,
        })
    }

    /// Validate a caller-supplied task list against phase ordering and
    /// inspection prerequisites. Order-preserving, one result per task.
    pub async fn validate_task_sequence(
        &self,
        tasks: &[Task],
    ) -> EngineResult<Vec<ValidationResult>> {
        // Inspection records for every project referenced by the input.
        let mut projects: Vec<&ProjectId> = tasks.iter().map(|t| &t.project_id).collect();
        projects.sort();
        projects.dedup();

        let mut inspections = Vec::new();
        for project in projects {
            inspections.extend(self.repo.fetch_inspections(project).await?);
        }

        Ok(validator::validate_tasks(tasks, &self.rules, &inspections))
    }

    /// Detect open conflicts for a project and persist them by signature.
    ///
    /// Idempotent: re-running against unchanged data yields the same
    /// conflict signatures, and previously resolved conflicts never
    /// re-open.
    pub async fn detect_schedule_conflicts(
        &self,
        project_id: &ProjectId,
    ) -> EngineResult<Vec<ScheduleConflict>> {
        let snapshot = self.snapshot(project_id).await?;
        let found = conflicts::detect_conflicts(
            &snapshot.tasks,
            &snapshot.inspections,
            &self.rules,
            &snapshot.resolved,
        );
        self.repo.upsert_conflicts(&found).await?;
        info!(
            "project {}: {} open conflict(s) detected",
            project_id,
            found.len()
        );
        Ok(found)
    }

    /// Compute and persist inspection schedules for every mandated phase
    /// present in the project. Manual overrides are authoritative.
    pub async fn auto_schedule_inspections(
        &self,
        project_id: &ProjectId,
    ) -> EngineResult<Vec<InspectionSchedule>> {
        let snapshot = self.snapshot(project_id).await?;
        let schedules = inspections::schedule_inspections(
            project_id,
            &snapshot.tasks,
            &snapshot.inspections,
            &self.rules,
            self.config.inspection_lead_days,
        );
        self.repo.upsert_inspections(project_id, &schedules).await?;
        Ok(schedules)
    }

    /// Compute the trade-sequencing optimization for a project.
    pub async fn optimize_trade_sequencing(
        &self,
        project_id: &ProjectId,
    ) -> EngineResult<OptimizedSchedule> {
        let snapshot = self.snapshot(project_id).await?;
        optimizer::optimize(&snapshot.tasks, &snapshot.inspections, &self.rules)
    }

    /// Mark a conflict resolved by signature.
    ///
    /// Idempotent: resolving an already-resolved conflict succeeds
    /// silently.
    pub async fn resolve_conflict(&self, signature: &str) -> EngineResult<()> {
        let newly_resolved = self.repo.resolve_conflict(signature).await?;
        if !newly_resolved {
            info!("conflict {} was already resolved, no-op", signature);
        }
        Ok(())
    }

    /// Run all four analyses concurrently over one immutable snapshot.
    ///
    /// The snapshot is fetched once; each analysis runs on its own blocking
    /// worker with its own copy. Exceeding the configured time budget
    /// yields [`EngineError::Timeout`] rather than a partial result. A
    /// dependency cycle degrades to `optimization: None`; the other three
    /// analyses are still returned.
    pub async fn analyze_project(&self, project_id: &ProjectId) -> EngineResult<ProjectAnalysis> {
        let snapshot = self.snapshot(project_id).await?;

        let rules = Arc::clone(&self.rules);
        let lead_days = self.config.inspection_lead_days;
        let budget = self.config.run_budget();

        let validation_handle = tokio::task::spawn_blocking({
            let snapshot = snapshot.clone();
            let rules = Arc::clone(&rules);
            move || validator::validate_tasks(&snapshot.tasks, &rules, &snapshot.inspections)
        });
        let conflicts_handle = tokio::task::spawn_blocking({
            let snapshot = snapshot.clone();
            let rules = Arc::clone(&rules);
            move || {
                conflicts::detect_conflicts(
                    &snapshot.tasks,
                    &snapshot.inspections,
                    &rules,
                    &snapshot.resolved,
                )
            }
        });
        let inspections_handle = tokio::task::spawn_blocking({
            let snapshot = snapshot.clone();
            let rules = Arc::clone(&rules);
            let project_id = project_id.clone();
            move || {
                inspections::schedule_inspections(
                    &project_id,
                    &snapshot.tasks,
                    &snapshot.inspections,
                    &rules,
                    lead_days,
                )
            }
        });
        let optimizer_handle = tokio::task::spawn_blocking({
            let snapshot = snapshot.clone();
            let rules = Arc::clone(&rules);
            move || optimizer::optimize(&snapshot.tasks, &snapshot.inspections, &rules)
        });

        let joined = tokio::time::timeout(budget, async {
            tokio::try_join!(
                validation_handle,
                conflicts_handle,
                inspections_handle,
                optimizer_handle
            )
        })
        .await
        .map_err(|_| EngineError::Timeout {
            budget_secs: self.config.run_budget_secs,
        })?
        .map_err(|e| EngineError::Worker(e.to_string()))?;

        let (validation, found_conflicts, schedules, optimization) = joined;

        let optimization = match optimization {
            Ok(optimized) => Some(optimized),
            Err(EngineError::GraphCycle { tasks }) => {
                warn!(
                    "project {}: optimization unavailable, dependency cycle among [{}]",
                    project_id, tasks
                );
                None
            }
            Err(other) => return Err(other),
        };

        // Persist derived artifacts after the joined computation.
        self.repo.upsert_conflicts(&found_conflicts).await?;
        self.repo.upsert_inspections(project_id, &schedules).await?;

        Ok(ProjectAnalysis {
            project_id: project_id.clone(),
            validation,
            conflicts: found_conflicts,
            inspections: schedules,
            optimization,
        })
    }
}
