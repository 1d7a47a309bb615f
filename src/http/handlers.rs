//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the engine
//! facade or repository for business logic.

use axum::{
    extract::{Path, State},
    Json,
};

use super::dto::{
    HealthResponse, InspectionOverrideRequest, ResolveConflictResponse, StoreTasksResponse,
    TaskDto, TaskListResponse, ValidateRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    InspectionSchedule, IssueSeverity, OptimizedSchedule, ProjectAnalysis, ProjectId,
    ScheduleConflict, TaskId, ValidationIssue, ValidationResult,
};
use crate::db::repository::{FullRepository, InspectionRepository, TaskRepository};
use crate::models::{Phase, Task};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the
/// repository is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository: repo_status,
    }))
}

// =============================================================================
// Task snapshots
// =============================================================================

/// PUT /v1/projects/{project_id}/tasks
///
/// Replace a project's task snapshot. The whole request is rejected when
/// any task carries an unknown phase or status; stored snapshots only hold
/// well-typed tasks.
pub async fn store_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<Vec<TaskDto>>,
) -> HandlerResult<StoreTasksResponse> {
    let project_id = ProjectId::new(project_id);
    let tasks: Vec<Task> = request
        .into_iter()
        .map(|dto| dto.into_task(&project_id))
        .collect::<Result<_, _>>()
        .map_err(AppError::BadRequest)?;

    let stored = state.repository.store_tasks(&project_id, tasks).await?;
    Ok(Json(StoreTasksResponse {
        project_id: project_id.0,
        stored,
    }))
}

/// GET /v1/projects/{project_id}/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> HandlerResult<TaskListResponse> {
    let project_id = ProjectId::new(project_id);
    let tasks = state.repository.fetch_tasks(&project_id).await?;
    let total = tasks.len();
    Ok(Json(TaskListResponse {
        project_id: project_id.0,
        tasks,
        total,
    }))
}

// =============================================================================
// Validation
// =============================================================================

/// POST /v1/validate
///
/// Validate a caller-supplied task list. A task with an unknown phase or
/// status is reported per-task as a critical data-integrity result;
/// validation continues for the remaining tasks. Output order matches
/// input order.
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> HandlerResult<Vec<ValidationResult>> {
    let project_id = ProjectId::new(request.project_id);

    let mut parsed: Vec<Result<Task, ValidationResult>> = Vec::with_capacity(request.tasks.len());
    for dto in request.tasks {
        let task_id = TaskId::new(dto.id.clone());
        let task_name = dto.name.clone();
        match dto.into_task(&project_id) {
            Ok(task) => parsed.push(Ok(task)),
            Err(message) => parsed.push(Err(ValidationResult::from_issues(
                task_id,
                task_name,
                vec![ValidationIssue {
                    severity: IssueSeverity::Critical,
                    description: message,
                    remediation: None,
                }],
            ))),
        }
    }

    let tasks: Vec<Task> = parsed.iter().filter_map(|p| p.as_ref().ok()).cloned().collect();
    let mut engine_results = state
        .engine
        .validate_task_sequence(&tasks)
        .await?
        .into_iter();

    let mut results = Vec::with_capacity(parsed.len());
    for entry in parsed {
        match entry {
            Ok(_) => {
                if let Some(result) = engine_results.next() {
                    results.push(result);
                }
            }
            Err(rejected) => results.push(rejected),
        }
    }
    Ok(Json(results))
}

// =============================================================================
// Conflicts
// =============================================================================

/// GET /v1/projects/{project_id}/conflicts
///
/// Run conflict detection over the project's stored snapshot. Detection
/// persists by signature; previously resolved conflicts are not re-emitted.
pub async fn get_conflicts(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> HandlerResult<Vec<ScheduleConflict>> {
    let project_id = ProjectId::new(project_id);
    let conflicts = state.engine.detect_schedule_conflicts(&project_id).await?;
    Ok(Json(conflicts))
}

/// POST /v1/conflicts/{signature}/resolve
///
/// Mark a conflict resolved by signature. Idempotent.
pub async fn resolve_conflict(
    State(state): State<AppState>,
    Path(signature): Path<String>,
) -> HandlerResult<ResolveConflictResponse> {
    state.engine.resolve_conflict(&signature).await?;
    Ok(Json(ResolveConflictResponse {
        signature,
        status: "resolved".to_string(),
    }))
}

// =============================================================================
// Inspections
// =============================================================================

/// GET /v1/projects/{project_id}/inspections
///
/// Compute and persist inspection schedules for the project. Manual
/// overrides are authoritative and returned as stored.
pub async fn get_inspections(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> HandlerResult<Vec<InspectionSchedule>> {
    let project_id = ProjectId::new(project_id);
    let schedules = state.engine.auto_schedule_inspections(&project_id).await?;
    Ok(Json(schedules))
}

/// PUT /v1/projects/{project_id}/inspections/{phase}
///
/// Record a manual inspection date for a phase. Rejected when the phase
/// mandates no inspection.
pub async fn set_inspection_date(
    State(state): State<AppState>,
    Path((project_id, phase)): Path<(String, String)>,
    Json(request): Json<InspectionOverrideRequest>,
) -> HandlerResult<InspectionSchedule> {
    let project_id = ProjectId::new(project_id);
    let phase: Phase = phase.parse().map_err(AppError::BadRequest)?;
    let schedule = state
        .repository
        .set_manual_inspection_date(&project_id, phase, request.date)
        .await?;
    Ok(Json(schedule))
}

// =============================================================================
// Optimization and combined analysis
// =============================================================================

/// GET /v1/projects/{project_id}/optimization
///
/// Compute the trade-sequencing optimization for the project's snapshot.
pub async fn get_optimization(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> HandlerResult<OptimizedSchedule> {
    let project_id = ProjectId::new(project_id);
    let optimized = state.engine.optimize_trade_sequencing(&project_id).await?;
    Ok(Json(optimized))
}

/// GET /v1/projects/{project_id}/analysis
///
/// Run all four analyses concurrently over one snapshot.
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> HandlerResult<ProjectAnalysis> {
    let project_id = ProjectId::new(project_id);
    let analysis = state.engine.analyze_project(&project_id).await?;
    Ok(Json(analysis))
}
