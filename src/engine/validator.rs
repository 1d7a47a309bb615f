//! Sequence validation of a project's task list.
//!
//! Pure, deterministic analysis over a task snapshot plus the static
//! phase-ordering rule table. One result per input task, order-preserving.
//! Data problems are reported as issues and never abort the run.

use chrono::Duration;

use crate::api::{IssueSeverity, ValidationIssue, ValidationResult};
use crate::models::{Phase, PhaseOrderingRules, Task, TaskStatus};
use crate::api::InspectionSchedule;

/// An unfinished predecessor phase blocking a task's start.
pub(crate) struct PrerequisiteViolation<'a> {
    pub predecessor_phase: Phase,
    /// Predecessor tasks not yet complete whose end date falls after the
    /// dependent task's start, latest end first.
    pub blockers: Vec<&'a Task>,
}

/// Find predecessor-phase violations for one task against the snapshot.
///
/// Shared between the validator (critical issues) and the conflict detector
/// (sequence_violation conflicts) so both report the same findings.
pub(crate) fn prerequisite_violations<'a>(
    task: &Task,
    tasks: &'a [Task],
    rules: &PhaseOrderingRules,
) -> Vec<PrerequisiteViolation<'a>> {
    let Some(start) = task.start_date else {
        return Vec::new();
    };

    let mut violations = Vec::new();
    for &pred_phase in rules.predecessors(task.phase) {
        let mut blockers: Vec<&Task> = tasks
            .iter()
            .filter(|t| {
                t.project_id == task.project_id
                    && t.id != task.id
                    && t.phase == pred_phase
                    && t.status != TaskStatus::Completed
                    && t.end_date.is_some_and(|end| end > start)
            })
            .collect();
        if !blockers.is_empty() {
            blockers.sort_by(|a, b| b.end_date.cmp(&a.end_date).then(a.id.cmp(&b.id)));
            violations.push(PrerequisiteViolation {
                predecessor_phase: pred_phase,
                blockers,
            });
        }
    }
    violations
}

/// Validate every task in the snapshot against phase ordering and
/// inspection prerequisites.
pub fn validate_tasks(
    tasks: &[Task],
    rules: &PhaseOrderingRules,
    inspections: &[InspectionSchedule],
) -> Vec<ValidationResult> {
    tasks
        .iter()
        .map(|task| validate_task(task, tasks, rules, inspections))
        .collect()
}

fn validate_task(
    task: &Task,
    tasks: &[Task],
    rules: &PhaseOrderingRules,
    inspections: &[InspectionSchedule],
) -> ValidationResult {
    let mut issues = Vec::new();

    check_dates(task, &mut issues);
    check_prerequisites(task, tasks, rules, &mut issues);
    check_inspection(task, inspections, &mut issues);
    check_advisories(task, &mut issues);

    ValidationResult::from_issues(task.id.clone(), task.name.clone(), issues)
}

fn check_dates(task: &Task, issues: &mut Vec<ValidationIssue>) {
    match (task.start_date, task.end_date) {
        (None, _) | (_, None) => {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Critical,
                description: format!("Task '{}' is missing a start or end date", task.name),
                remediation: Some("Set both start_date and end_date".to_string()),
            });
        }
        (Some(start), Some(end)) if end < start => {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Critical,
                description: format!(
                    "Task '{}' ends ({}) before it starts ({})",
                    task.name, end, start
                ),
                remediation: Some("Swap or correct the task dates".to_string()),
            });
        }
        _ => {}
    }
}

fn check_prerequisites(
    task: &Task,
    tasks: &[Task],
    rules: &PhaseOrderingRules,
    issues: &mut Vec<ValidationIssue>,
) {
    for violation in prerequisite_violations(task, tasks, rules) {
        // The latest-ending blocker determines the earliest safe start.
        let blocker = violation.blockers[0];
        let blocker_end = blocker.end_date.expect("blockers carry an end date");
        issues.push(ValidationIssue {
            severity: IssueSeverity::Critical,
            description: format!(
                "Task '{}' starts before prerequisite phase {} completes ('{}' ends {})",
                task.name, violation.predecessor_phase, blocker.name, blocker_end
            ),
            remediation: Some(format!(
                "Shift start_date of '{}' to {} or later",
                task.name,
                blocker_end + Duration::days(1)
            )),
        });
    }
}

fn check_inspection(
    task: &Task,
    inspections: &[InspectionSchedule],
    issues: &mut Vec<ValidationIssue>,
) {
    if !task.inspection_required {
        return;
    }
    let scheduled = inspections.iter().any(|i| {
        i.project_id == task.project_id
            && i.required_for_phase == task.phase
            && i.prerequisites_met
    });
    if !scheduled {
        issues.push(ValidationIssue {
            severity: IssueSeverity::High,
            description: format!(
                "Task '{}' requires an inspection but none is scheduled for phase {}",
                task.name, task.phase
            ),
            remediation: Some(format!(
                "Schedule the {} phase inspection before this task",
                task.phase
            )),
        });
    }
}

fn check_advisories(task: &Task, issues: &mut Vec<ValidationIssue>) {
    if task.status == TaskStatus::Blocked {
        issues.push(ValidationIssue {
            severity: IssueSeverity::Medium,
            description: format!(
                "Task '{}' is blocked but still occupies its schedule window",
                task.name
            ),
            remediation: Some("Unblock the task or reschedule its window".to_string()),
        });
    }
    if task.assigned_trade.is_none() && task.status != TaskStatus::Completed {
        issues.push(ValidationIssue {
            severity: IssueSeverity::Low,
            description: format!("Task '{}' has no trade assigned", task.name),
            remediation: None,
        });
    }
}
