//! Public API surface for the schedule intelligence engine.
//!
//! This file consolidates the identifier newtypes and the derived analysis
//! artifact types returned by the four engine operations. All types derive
//! Serialize/Deserialize for JSON serialization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{InspectionType, Phase};

/// Project identifier (caller-supplied).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

/// Task identifier (caller-supplied).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

/// Conflict identifier, freshly generated per detection run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictId(pub Uuid);

/// Inspection schedule identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InspectionId(pub Uuid);

impl ProjectId {
    pub fn new(value: impl Into<String>) -> Self {
        ProjectId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        TaskId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl ConflictId {
    pub fn generate() -> Self {
        ConflictId(Uuid::new_v4())
    }
}

impl InspectionId {
    pub fn generate() -> Self {
        InspectionId(Uuid::new_v4())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for ConflictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for InspectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================
// Validation artifacts
// =========================================================

/// Severity of a validation issue.
///
/// Ordered from most to least severe so `Ord` comparisons read naturally.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    /// Critical/high issues invalidate a task; medium/low are advisory.
    pub fn invalidates(&self) -> bool {
        matches!(self, IssueSeverity::Critical | IssueSeverity::High)
    }
}

/// A single problem found while validating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub description: String,
    /// Suggested fix, when one can be computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Per-task validation outcome, order-preserving with the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub task_id: TaskId,
    pub task_name: String,
    /// True iff no critical/high issues were found.
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
}

impl ValidationResult {
    /// Build a result from collected issues, deriving validity and
    /// recommendations.
    pub fn from_issues(task_id: TaskId, task_name: String, issues: Vec<ValidationIssue>) -> Self {
        let is_valid = !issues.iter().any(|i| i.severity.invalidates());
        let recommendations = issues
            .iter()
            .filter_map(|i| i.remediation.clone())
            .collect();
        Self {
            task_id,
            task_name,
            is_valid,
            issues,
            recommendations,
        }
    }
}

// =========================================================
// Conflict artifacts
// =========================================================

/// Kind of scheduling conflict. Closed set; consumers match exhaustively.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    SequenceViolation,
    TradeOverlap,
    ResourceConflict,
    InspectionBlocking,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::SequenceViolation => "sequence_violation",
            ConflictType::TradeOverlap => "trade_overlap",
            ConflictType::ResourceConflict => "resource_conflict",
            ConflictType::InspectionBlocking => "inspection_blocking",
        }
    }
}

/// Lifecycle state of a conflict. Conflicts are never deleted; superseded
/// ones are marked resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Open,
    Resolved,
}

/// A detected scheduling conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub id: ConflictId,
    pub project_id: ProjectId,
    pub conflict_type: ConflictType,
    pub severity: IssueSeverity,
    pub affected_tasks: Vec<TaskId>,
    pub description: String,
    pub suggested_resolution: String,
    /// Advisory: resolution is a pure schedule shift with no dependency
    /// violation. The engine never applies shifts itself.
    pub auto_resolvable: bool,
    pub resolution_status: ResolutionStatus,
}

impl ScheduleConflict {
    /// Stable signature over type + sorted affected task ids.
    ///
    /// Ids are regenerated each detection run; the signature is what makes
    /// repeated runs and resolution idempotent.
    pub fn signature(&self) -> String {
        crate::engine::signature::conflict_signature(self.conflict_type, &self.affected_tasks)
    }
}

// =========================================================
// Inspection artifacts
// =========================================================

/// A scheduled (or proposed) regulatory inspection for a phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionSchedule {
    pub id: InspectionId,
    pub project_id: ProjectId,
    pub inspection_type: InspectionType,
    pub required_for_phase: Phase,
    pub optimal_date: NaiveDate,
    /// True iff every task in the inspected phase was completed at
    /// evaluation time.
    pub prerequisites_met: bool,
    /// True when the engine picked the date; false for manual overrides,
    /// which the engine treats as authoritative.
    pub auto_scheduled: bool,
}

// =========================================================
// Optimization artifacts
// =========================================================

/// Kind of schedule optimization proposal. Closed set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationType {
    OverlapParallelTrades,
    ReorderNonCritical,
    CompressBuffer,
}

/// A single proposed optimization with its projected saving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationAction {
    pub action_type: OptimizationType,
    pub description: String,
    pub tasks_affected: Vec<TaskId>,
    /// Days saved, always >= 0.
    pub time_impact: i64,
}

/// Result of the trade-sequencing optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedSchedule {
    pub optimizations_applied: Vec<OptimizationAction>,
    /// Sum of the individual time impacts, in days.
    pub estimated_time_saved: i64,
    /// Naive sequential completion minus savings, clamped to the
    /// critical-path floor. None when no datable tasks exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_completion_date: Option<NaiveDate>,
    /// Minimum achievable completion date given the dependency graph.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_path_floor: Option<NaiveDate>,
    /// Task ids on the critical path, in chain order.
    pub critical_path: Vec<TaskId>,
}

impl OptimizedSchedule {
    /// Result for a project with no schedulable tasks.
    pub fn empty() -> Self {
        Self {
            optimizations_applied: Vec::new(),
            estimated_time_saved: 0,
            new_completion_date: None,
            critical_path_floor: None,
            critical_path: Vec::new(),
        }
    }
}

// =========================================================
// Joined analysis output
// =========================================================

/// Output of running all four analyses over one immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub project_id: ProjectId,
    pub validation: Vec<ValidationResult>,
    pub conflicts: Vec<ScheduleConflict>,
    pub inspections: Vec<InspectionSchedule>,
    /// None when the optimizer reported a dependency cycle; the other
    /// analyses are still usable ("optimization unavailable").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizedSchedule>,
}
