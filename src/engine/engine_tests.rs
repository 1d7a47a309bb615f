//! Facade-level tests for [`ScheduleEngine`].

use std::sync::Arc;

use chrono::NaiveDate;

use super::*;
use crate::api::{ConflictType, ProjectId, TaskId};
use crate::db::repositories::LocalRepository;
use crate::db::repository::{ConflictRepository, InspectionRepository, TaskRepository};
use crate::models::{Phase, PhaseOrderingRules, Task, TaskStatus, Trade};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task(id: &str, phase: Phase, trade: &str, start: NaiveDate, end: NaiveDate) -> Task {
    Task {
        id: TaskId::new(id),
        name: id.to_string(),
        phase,
        start_date: Some(start),
        end_date: Some(end),
        status: TaskStatus::NotStarted,
        assigned_trade: Some(Trade::new(trade)),
        inspection_required: false,
        project_id: ProjectId::new("p1"),
    }
}

/// Framing double-booking: the standing conflict fixture.
fn overlap_tasks() -> Vec<Task> {
    vec![
        task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15)),
        task("f2", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 18)),
    ]
}

async fn engine_with(tasks: Vec<Task>) -> (ScheduleEngine, Arc<LocalRepository>) {
    let repo = Arc::new(LocalRepository::new());
    if !tasks.is_empty() {
        repo.store_tasks(&ProjectId::new("p1"), tasks).await.unwrap();
    }
    let engine = ScheduleEngine::with_defaults(repo.clone() as Arc<dyn FullRepository>);
    (engine, repo)
}

#[tokio::test]
async fn test_validate_preserves_input_order() {
    let (engine, _repo) = engine_with(Vec::new()).await;
    let tasks = vec![
        task("a", Phase::SitePrep, "excavation", date(2025, 5, 1), date(2025, 5, 5)),
        task("b", Phase::Framing, "b", date(2025, 5, 6), date(2025, 5, 10)),
    ];
    let results = engine.validate_task_sequence(&tasks).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].task_id, TaskId::new("a"));
    assert_eq!(results[1].task_id, TaskId::new("b"));
}

#[tokio::test]
async fn test_detect_persists_conflicts() {
    let (engine, repo) = engine_with(overlap_tasks()).await;
    let project = ProjectId::new("p1");

    let found = engine.detect_schedule_conflicts(&project).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].conflict_type, ConflictType::TradeOverlap);

    let stored = repo.fetch_conflicts(&project).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_repeated_detection_stores_once() {
    let (engine, repo) = engine_with(overlap_tasks()).await;
    let project = ProjectId::new("p1");

    engine.detect_schedule_conflicts(&project).await.unwrap();
    engine.detect_schedule_conflicts(&project).await.unwrap();
    assert_eq!(repo.conflict_count(), 1);
}

#[tokio::test]
async fn test_resolved_conflict_stays_resolved_across_runs() {
    let (engine, _repo) = engine_with(overlap_tasks()).await;
    let project = ProjectId::new("p1");

    let found = engine.detect_schedule_conflicts(&project).await.unwrap();
    let signature = found[0].signature();
    engine.resolve_conflict(&signature).await.unwrap();

    let second = engine.detect_schedule_conflicts(&project).await.unwrap();
    assert!(second.is_empty(), "resolved conflict must not re-emit");
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let (engine, _repo) = engine_with(overlap_tasks()).await;
    let project = ProjectId::new("p1");

    let found = engine.detect_schedule_conflicts(&project).await.unwrap();
    let signature = found[0].signature();
    engine.resolve_conflict(&signature).await.unwrap();
    // Second resolve is a silent no-op.
    engine.resolve_conflict(&signature).await.unwrap();
}

#[tokio::test]
async fn test_resolve_unknown_signature_errors() {
    let (engine, _repo) = engine_with(Vec::new()).await;
    let err = engine.resolve_conflict("deadbeef").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Repository(RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_auto_schedule_persists_inspections() {
    let mut foundation = task(
        "fo",
        Phase::Foundation,
        "concrete",
        date(2025, 5, 1),
        date(2025, 5, 9),
    );
    foundation.status = TaskStatus::Completed;
    let (engine, repo) = engine_with(vec![foundation]).await;
    let project = ProjectId::new("p1");

    let schedules = engine.auto_schedule_inspections(&project).await.unwrap();
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].required_for_phase, Phase::Foundation);
    assert!(schedules[0].prerequisites_met);

    let stored = repo.fetch_inspections(&project).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_manual_override_wins_over_auto_schedule() {
    let foundation = task(
        "fo",
        Phase::Foundation,
        "concrete",
        date(2025, 5, 1),
        date(2025, 5, 9),
    );
    let (engine, repo) = engine_with(vec![foundation]).await;
    let project = ProjectId::new("p1");

    let manual_date = date(2025, 6, 2);
    repo.set_manual_inspection_date(&project, Phase::Foundation, manual_date)
        .await
        .unwrap();

    let schedules = engine.auto_schedule_inspections(&project).await.unwrap();
    let foundation_slot = schedules
        .iter()
        .find(|s| s.required_for_phase == Phase::Foundation)
        .unwrap();
    assert_eq!(foundation_slot.optimal_date, manual_date);
    assert!(!foundation_slot.auto_scheduled);
}

#[tokio::test]
async fn test_optimize_through_facade() {
    let tasks = vec![
        task("sp", Phase::SitePrep, "excavation", date(2025, 5, 1), date(2025, 5, 5)),
        task("fo", Phase::Foundation, "concrete", date(2025, 5, 6), date(2025, 5, 15)),
    ];
    let (engine, _repo) = engine_with(tasks).await;

    let optimized = engine
        .optimize_trade_sequencing(&ProjectId::new("p1"))
        .await
        .unwrap();
    assert_eq!(
        optimized.critical_path,
        vec![TaskId::new("sp"), TaskId::new("fo")]
    );
    assert!(optimized.new_completion_date.unwrap() >= optimized.critical_path_floor.unwrap());
}

#[tokio::test]
async fn test_analyze_project_combines_all_four() {
    let mut tasks = overlap_tasks();
    tasks.push(task(
        "sp",
        Phase::SitePrep,
        "excavation",
        date(2025, 5, 1),
        date(2025, 5, 5),
    ));
    let (engine, repo) = engine_with(tasks).await;
    let project = ProjectId::new("p1");

    let analysis = engine.analyze_project(&project).await.unwrap();
    assert_eq!(analysis.project_id, project);
    assert_eq!(analysis.validation.len(), 3);
    assert_eq!(analysis.conflicts.len(), 1);
    assert!(analysis.optimization.is_some());

    // Derived artifacts were persisted after the run.
    assert_eq!(repo.conflict_count(), 1);
}

#[tokio::test]
async fn test_analyze_empty_project() {
    let (engine, _repo) = engine_with(Vec::new()).await;
    let analysis = engine
        .analyze_project(&ProjectId::new("p1"))
        .await
        .unwrap();
    assert!(analysis.validation.is_empty());
    assert!(analysis.conflicts.is_empty());
    assert!(analysis.inspections.is_empty());
    let optimization = analysis.optimization.unwrap();
    assert!(optimization.critical_path.is_empty());
    assert!(optimization.new_completion_date.is_none());
}

#[tokio::test]
async fn test_zero_budget_times_out() {
    let repo = Arc::new(LocalRepository::new());
    repo.store_tasks(&ProjectId::new("p1"), overlap_tasks())
        .await
        .unwrap();
    let config = EngineConfig {
        run_budget_secs: 0,
        ..EngineConfig::default()
    };
    let engine = ScheduleEngine::new(
        repo as Arc<dyn FullRepository>,
        PhaseOrderingRules::standard(),
        config,
    );

    let err = engine
        .analyze_project(&ProjectId::new("p1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Timeout { budget_secs: 0 }));
}

#[tokio::test]
async fn test_concurrent_resolution_is_idempotent() {
    let (engine, _repo) = engine_with(overlap_tasks()).await;
    let project = ProjectId::new("p1");
    let found = engine.detect_schedule_conflicts(&project).await.unwrap();
    let signature = found[0].signature();

    let a = {
        let engine = engine.clone();
        let signature = signature.clone();
        tokio::spawn(async move { engine.resolve_conflict(&signature).await })
    };
    let b = {
        let engine = engine.clone();
        let signature = signature.clone();
        tokio::spawn(async move { engine.resolve_conflict(&signature).await })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();
}
