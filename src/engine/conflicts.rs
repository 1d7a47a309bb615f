//! Conflict detection across tasks, trades, and inspections.
//!
//! Pure analysis over a project snapshot. Detection is idempotent by
//! conflict signature: ids are regenerated per run but the set of
//! (type, affected_tasks) findings is stable for unchanged input.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use log::debug;

use crate::api::{
    ConflictId, ConflictType, InspectionSchedule, IssueSeverity, ResolutionStatus,
    ScheduleConflict, TaskId,
};
use crate::engine::validator::prerequisite_violations;
use crate::models::{PhaseOrderingRules, Task, Trade};

/// Detect all open conflicts in the snapshot.
///
/// Conflicts whose signature appears in `resolved` are not re-emitted; a
/// detection run reports only the delta of currently-open problems. Tasks
/// with malformed dates are skipped from interval construction (the
/// validator flags those separately).
pub fn detect_conflicts(
    tasks: &[Task],
    inspections: &[InspectionSchedule],
    rules: &PhaseOrderingRules,
    resolved: &HashSet<String>,
) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();

    detect_trade_overlaps(tasks, rules, &mut conflicts);
    detect_sequence_violations(tasks, rules, &mut conflicts);
    detect_inspection_blocking(tasks, inspections, rules, &mut conflicts);

    // Dedup within the run, then drop previously resolved signatures.
    let mut seen = HashSet::new();
    let before = conflicts.len();
    conflicts.retain(|c| {
        let sig = c.signature();
        !resolved.contains(&sig) && seen.insert(sig)
    });
    debug!(
        "conflict detection: {} found, {} after dedup/resolution filter",
        before,
        conflicts.len()
    );

    conflicts
}

/// Trade overlap: two tasks of the same trade with intersecting windows.
fn detect_trade_overlaps(
    tasks: &[Task],
    rules: &PhaseOrderingRules,
    out: &mut Vec<ScheduleConflict>,
) {
    let mut by_trade: HashMap<&Trade, Vec<&Task>> = HashMap::new();
    for task in tasks {
        if !task.has_valid_dates() {
            continue;
        }
        if let Some(trade) = &task.assigned_trade {
            by_trade.entry(trade).or_default().push(task);
        }
    }

    let mut trades: Vec<&Trade> = by_trade.keys().copied().collect();
    trades.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    for trade in trades {
        let mut group = by_trade[trade].clone();
        group.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));

        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let (earlier, later) = (group[i], group[j]);
                let overlap = earlier.overlap_days(later).unwrap_or(0);
                if overlap == 0 {
                    continue;
                }

                let shorter = earlier
                    .duration_days()
                    .unwrap()
                    .min(later.duration_days().unwrap());
                // Escalate when the overlap swallows half the shorter task.
                let severity = if overlap * 2 >= shorter {
                    IssueSeverity::High
                } else {
                    IssueSeverity::Medium
                };

                let auto_resolvable = can_shift_forward(later, overlap, tasks, rules);
                let suggested_resolution = format!(
                    "Shift '{}' to start {} or later, after '{}' releases the {} crew",
                    later.name,
                    earlier.end_date.unwrap() + Duration::days(1),
                    earlier.name,
                    trade
                );

                out.push(ScheduleConflict {
                    id: ConflictId::generate(),
                    project_id: earlier.project_id.clone(),
                    conflict_type: ConflictType::TradeOverlap,
                    severity,
                    affected_tasks: vec![earlier.id.clone(), later.id.clone()],
                    description: format!(
                        "Trade {} is double-booked: '{}' and '{}' overlap by {} day(s)",
                        trade, earlier.name, later.name, overlap
                    ),
                    suggested_resolution,
                    auto_resolvable,
                    resolution_status: ResolutionStatus::Open,
                });
            }
        }
    }
}

/// Whether shifting `task` forward by `shift_days` violates any phase
/// dependency or inspection requirement.
///
/// A shift is safe only when the task needs no inspection and no
/// successor-phase task starts before the shifted end date.
fn can_shift_forward(
    task: &Task,
    shift_days: i64,
    tasks: &[Task],
    rules: &PhaseOrderingRules,
) -> bool {
    if task.inspection_required {
        return false;
    }
    let Some(end) = task.end_date else {
        return false;
    };
    let shifted_end = end + Duration::days(shift_days);

    !tasks.iter().any(|t| {
        t.project_id == task.project_id
            && rules.requires(t.phase, task.phase)
            && t.start_date.is_some_and(|start| start <= shifted_end)
    })
}

/// Sequence violations: the validator's critical prerequisite findings,
/// re-expressed as conflicts. Resolving one is a human scheduling decision,
/// never an automatic shift.
fn detect_sequence_violations(
    tasks: &[Task],
    rules: &PhaseOrderingRules,
    out: &mut Vec<ScheduleConflict>,
) {
    for task in tasks {
        for violation in prerequisite_violations(task, tasks, rules) {
            let blocker = violation.blockers[0];
            let mut affected: Vec<TaskId> = vec![task.id.clone()];
            affected.extend(violation.blockers.iter().map(|b| b.id.clone()));

            out.push(ScheduleConflict {
                id: ConflictId::generate(),
                project_id: task.project_id.clone(),
                conflict_type: ConflictType::SequenceViolation,
                severity: IssueSeverity::Critical,
                affected_tasks: affected,
                description: format!(
                    "Task '{}' starts before prerequisite phase {} completes",
                    task.name, violation.predecessor_phase
                ),
                suggested_resolution: format!(
                    "Reschedule '{}' after '{}' completes ({})",
                    task.name,
                    blocker.name,
                    blocker.end_date.expect("blockers carry an end date")
                ),
                auto_resolvable: false,
                resolution_status: ResolutionStatus::Open,
            });
        }
    }
}

/// Inspection blocking: a later-phase task depends on an inspection whose
/// prerequisites are unmet and whose date lands after that task starts.
fn detect_inspection_blocking(
    tasks: &[Task],
    inspections: &[InspectionSchedule],
    rules: &PhaseOrderingRules,
    out: &mut Vec<ScheduleConflict>,
) {
    for task in tasks {
        let Some(start) = task.start_date else {
            continue;
        };
        for &pred_phase in rules.predecessors(task.phase) {
            if rules.inspection_for(pred_phase).is_none() {
                continue;
            }
            let blocking = inspections.iter().find(|i| {
                i.project_id == task.project_id
                    && i.required_for_phase == pred_phase
                    && !i.prerequisites_met
                    && i.optimal_date > start
            });
            if let Some(inspection) = blocking {
                out.push(ScheduleConflict {
                    id: ConflictId::generate(),
                    project_id: task.project_id.clone(),
                    conflict_type: ConflictType::InspectionBlocking,
                    severity: IssueSeverity::Critical,
                    affected_tasks: vec![task.id.clone()],
                    description: format!(
                        "Task '{}' starts {} but the {} inspection ({}) is not cleared until {}",
                        task.name,
                        start,
                        pred_phase,
                        inspection.inspection_type,
                        inspection.optimal_date
                    ),
                    suggested_resolution: format!(
                        "Delay '{}' until after the {} inspection on {}",
                        task.name, pred_phase, inspection.optimal_date
                    ),
                    auto_resolvable: false,
                    resolution_status: ResolutionStatus::Open,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InspectionId, ProjectId};
    use crate::models::{InspectionType, Phase, TaskStatus};
    use chrono::NaiveDate;

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

    #[test]
    fn test_trade_overlap_detected_once() {
        // Two framing tasks on the same crew, May 8-15 and May 12-18.
        let tasks = vec![
            task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15)),
            task("f2", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 18)),
        ];
        let conflicts =
            detect_conflicts(&tasks, &[], &PhaseOrderingRules::standard(), &HashSet::new());

        let overlaps: Vec<_> = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::TradeOverlap)
            .collect();
        assert_eq!(overlaps.len(), 1, "exactly one overlap, reported once");
        let c = overlaps[0];
        // Overlap May 12-15 = 4 days, shorter task is 7 days: >= 50%.
        assert_eq!(c.severity, IssueSeverity::High);
        assert!(c.affected_tasks.contains(&TaskId::new("f1")));
        assert!(c.affected_tasks.contains(&TaskId::new("f2")));
        assert!(c.auto_resolvable, "no downstream dependency blocks a shift");
    }

    #[test]
    fn test_three_way_overlap_reports_every_pair_once() {
        // Three framing tasks on one crew sharing the May 12-15 window:
        // every pair overlaps, so all three pairs conflict.
        let tasks = vec![
            task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15)),
            task("f2", Phase::Framing, "b", date(2025, 5, 10), date(2025, 5, 17)),
            task("f3", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 19)),
        ];
        let conflicts =
            detect_conflicts(&tasks, &[], &PhaseOrderingRules::standard(), &HashSet::new());

        let overlaps: Vec<_> = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::TradeOverlap)
            .collect();
        assert_eq!(overlaps.len(), 3, "one conflict per overlapping pair");

        let mut pairs: Vec<Vec<&str>> = overlaps
            .iter()
            .map(|c| {
                let mut ids: Vec<&str> = c.affected_tasks.iter().map(|t| t.0.as_str()).collect();
                ids.sort();
                ids
            })
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![vec!["f1", "f2"], vec!["f1", "f3"], vec!["f2", "f3"]]
        );
    }

    #[test]
    fn test_short_overlap_is_medium() {
        let tasks = vec![
            task("e1", Phase::RoughIn, "electrical", date(2025, 6, 1), date(2025, 6, 10)),
            task("e2", Phase::RoughIn, "electrical", date(2025, 6, 10), date(2025, 6, 19)),
        ];
        let conflicts =
            detect_conflicts(&tasks, &[], &PhaseOrderingRules::standard(), &HashSet::new());
        let overlap = conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::TradeOverlap)
            .unwrap();
        // One shared day out of ten.
        assert_eq!(overlap.severity, IssueSeverity::Medium);
    }

    #[test]
    fn test_different_trades_do_not_conflict() {
        let tasks = vec![
            task("e1", Phase::RoughIn, "electrical", date(2025, 6, 1), date(2025, 6, 10)),
            task("p1", Phase::RoughIn, "plumbing", date(2025, 6, 1), date(2025, 6, 10)),
        ];
        let conflicts =
            detect_conflicts(&tasks, &[], &PhaseOrderingRules::standard(), &HashSet::new());
        assert!(conflicts
            .iter()
            .all(|c| c.conflict_type != ConflictType::TradeOverlap));
    }

    #[test]
    fn test_overlap_not_auto_resolvable_with_downstream_dependency() {
        // Shifting f2 forward would collide with the rough-in start.
        let tasks = vec![
            task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15)),
            task("f2", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 18)),
            task("r1", Phase::RoughIn, "electrical", date(2025, 5, 19), date(2025, 5, 25)),
        ];
        let conflicts =
            detect_conflicts(&tasks, &[], &PhaseOrderingRules::standard(), &HashSet::new());
        let overlap = conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::TradeOverlap)
            .unwrap();
        assert!(!overlap.auto_resolvable);
    }

    #[test]
    fn test_overlap_not_auto_resolvable_with_inspection() {
        let mut tasks = vec![
            task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15)),
            task("f2", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 18)),
        ];
        tasks[1].inspection_required = true;
        let conflicts =
            detect_conflicts(&tasks, &[], &PhaseOrderingRules::standard(), &HashSet::new());
        let overlap = conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::TradeOverlap)
            .unwrap();
        assert!(!overlap.auto_resolvable);
    }

    #[test]
    fn test_sequence_violation_conflict() {
        let mut foundation = task(
            "foundation",
            Phase::Foundation,
            "concrete",
            date(2025, 5, 1),
            date(2025, 5, 10),
        );
        foundation.status = TaskStatus::InProgress;
        let framing = task("framing", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 20));

        let conflicts = detect_conflicts(
            &[foundation, framing],
            &[],
            &PhaseOrderingRules::standard(),
            &HashSet::new(),
        );
        let seq = conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::SequenceViolation)
            .unwrap();
        assert_eq!(seq.severity, IssueSeverity::Critical);
        assert!(!seq.auto_resolvable);
        assert!(seq.affected_tasks.contains(&TaskId::new("framing")));
        assert!(seq.affected_tasks.contains(&TaskId::new("foundation")));
    }

    #[test]
    fn test_inspection_blocking_conflict() {
        let framing = task("framing", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 20));
        let inspection = InspectionSchedule {
            id: InspectionId::generate(),
            project_id: ProjectId::new("p1"),
            inspection_type: InspectionType::Foundation,
            required_for_phase: Phase::Foundation,
            optimal_date: date(2025, 5, 15),
            prerequisites_met: false,
            auto_scheduled: true,
        };
        let conflicts = detect_conflicts(
            &[framing],
            &[inspection],
            &PhaseOrderingRules::standard(),
            &HashSet::new(),
        );
        let blocking = conflicts
            .iter()
            .find(|c| c.conflict_type == ConflictType::InspectionBlocking)
            .unwrap();
        assert_eq!(blocking.severity, IssueSeverity::Critical);
    }

    #[test]
    fn test_detection_is_idempotent_by_signature() {
        let tasks = vec![
            task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15)),
            task("f2", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 18)),
        ];
        let rules = PhaseOrderingRules::standard();
        let first = detect_conflicts(&tasks, &[], &rules, &HashSet::new());
        let second = detect_conflicts(&tasks, &[], &rules, &HashSet::new());

        let sigs = |cs: &[ScheduleConflict]| {
            let mut v: Vec<String> = cs.iter().map(|c| c.signature()).collect();
            v.sort();
            v
        };
        assert_eq!(sigs(&first), sigs(&second));
    }

    #[test]
    fn test_resolved_conflicts_not_reemitted() {
        let tasks = vec![
            task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15)),
            task("f2", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 18)),
        ];
        let rules = PhaseOrderingRules::standard();
        let first = detect_conflicts(&tasks, &[], &rules, &HashSet::new());
        let resolved: HashSet<String> = first.iter().map(|c| c.signature()).collect();

        let second = detect_conflicts(&tasks, &[], &rules, &resolved);
        assert!(second.is_empty(), "resolved conflicts never re-open");
    }

    #[test]
    fn test_tasks_without_dates_skipped() {
        let mut broken = task("f1", Phase::Framing, "b", date(2025, 5, 8), date(2025, 5, 15));
        broken.start_date = None;
        let ok = task("f2", Phase::Framing, "b", date(2025, 5, 12), date(2025, 5, 18));

        let conflicts = detect_conflicts(
            &[broken, ok],
            &[],
            &PhaseOrderingRules::standard(),
            &HashSet::new(),
        );
        assert!(conflicts.is_empty(), "undatable tasks emit no conflicts");
    }

    #[test]
    fn test_empty_input() {
        let conflicts =
            detect_conflicts(&[], &[], &PhaseOrderingRules::standard(), &HashSet::new());
        assert!(conflicts.is_empty());
    }
}
