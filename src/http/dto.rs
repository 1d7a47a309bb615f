//! Data Transfer Objects for the HTTP API.
//!
//! Phases, statuses and trades arrive as strings and are converted at this
//! boundary; the engine-internal types stay closed enums. Analysis artifact
//! types already derive Serialize and are re-exported unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Re-export artifact types that are already serializable
pub use crate::api::{
    InspectionSchedule, OptimizationAction, OptimizedSchedule, ProjectAnalysis, ScheduleConflict,
    ValidationIssue, ValidationResult,
};

use crate::api::{ProjectId, TaskId};
use crate::models::{Phase, Task, TaskStatus, Trade};

/// A task as submitted over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: String,
    pub name: String,
    /// Construction phase name (snake_case, e.g. "rough_in")
    pub phase: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Task status ("not_started", "in_progress", "completed", "blocked")
    pub status: String,
    #[serde(default)]
    pub assigned_trade: Option<String>,
    #[serde(default)]
    pub inspection_required: bool,
}

impl TaskDto {
    /// Convert into the domain task, rejecting unknown phase/status names.
    pub fn into_task(self, project_id: &ProjectId) -> Result<Task, String> {
        let phase: Phase = self
            .phase
            .parse()
            .map_err(|e| format!("task {}: {}", self.id, e))?;
        let status = parse_status(&self.status)
            .ok_or_else(|| format!("task {}: unknown task status: {}", self.id, self.status))?;
        Ok(Task {
            id: TaskId::new(self.id),
            name: self.name,
            phase,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            assigned_trade: self.assigned_trade.map(Trade::new),
            inspection_required: self.inspection_required,
            project_id: project_id.clone(),
        })
    }
}

fn parse_status(s: &str) -> Option<TaskStatus> {
    match s {
        "not_started" => Some(TaskStatus::NotStarted),
        "in_progress" => Some(TaskStatus::InProgress),
        "completed" => Some(TaskStatus::Completed),
        "blocked" => Some(TaskStatus::Blocked),
        _ => None,
    }
}

/// Request body for validating a task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// Project the tasks belong to
    pub project_id: String,
    pub tasks: Vec<TaskDto>,
}

/// Response for storing a project's task snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreTasksResponse {
    pub project_id: String,
    /// Number of tasks stored
    pub stored: usize,
}

/// Response listing a project's stored tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub project_id: String,
    pub tasks: Vec<Task>,
    pub total: usize,
}

/// Response for resolving a conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConflictResponse {
    pub signature: String,
    pub status: String,
}

/// Request body for a manual inspection date override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionOverrideRequest {
    pub date: NaiveDate,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// API version
    pub version: String,
    /// Repository health
    pub repository: String,
}
