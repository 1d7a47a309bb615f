//! Regulatory inspection scheduling.
//!
//! Computes earliest-valid inspection windows for each phase that mandates
//! one, honoring a configurable business-day lead time, single-slot daily
//! capacity, and caller-supplied manual overrides.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::debug;

use crate::api::{InspectionId, InspectionSchedule, ProjectId};
use crate::models::{Phase, PhaseOrderingRules, Task, TaskStatus};

/// Advance a date by `days` business days, skipping weekends.
pub fn add_business_days(date: NaiveDate, days: i64) -> NaiveDate {
    let mut current = date;
    let mut remaining = days;
    while remaining > 0 {
        current += Duration::days(1);
        if !is_weekend(current) {
            remaining -= 1;
        }
    }
    // A zero-day advance still cannot land on a weekend.
    while is_weekend(current) {
        current += Duration::days(1);
    }
    current
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Compute inspection schedules for every mandated phase present in the
/// project's tasks.
///
/// Existing records with `auto_scheduled == false` are manual overrides:
/// they are returned unchanged, never recomputed, and their dates occupy
/// capacity slots. Engine-produced entries always carry
/// `auto_scheduled = true`.
pub fn schedule_inspections(
    project_id: &ProjectId,
    tasks: &[Task],
    existing: &[InspectionSchedule],
    rules: &PhaseOrderingRules,
    lead_days: i64,
) -> Vec<InspectionSchedule> {
    let phase_completion = phase_completion_dates(tasks);

    let manual: HashMap<Phase, &InspectionSchedule> = existing
        .iter()
        .filter(|i| i.project_id == *project_id && !i.auto_scheduled)
        .map(|i| (i.required_for_phase, i))
        .collect();

    // One inspection per day: manual overrides claim their slots up front.
    let mut taken: HashSet<NaiveDate> = manual.values().map(|i| i.optimal_date).collect();

    let mut schedules = Vec::new();
    for phase in rules.inspected_phases() {
        let Some(inspection_type) = rules.inspection_for(phase) else {
            continue;
        };
        let Some(&phase_end) = phase_completion.get(&phase) else {
            // Phase not present among the project's tasks.
            continue;
        };

        if let Some(&manual_record) = manual.get(&phase) {
            debug!(
                "inspection for {} has a manual override on {}, keeping it",
                phase, manual_record.optimal_date
            );
            schedules.push(manual_record.clone());
            continue;
        }

        // Earliest candidate: after the phase and all its required
        // predecessors wrap up, plus the regulatory lead time.
        let mut latest_end = phase_end;
        for &pred in rules.predecessors(phase) {
            if let Some(&pred_end) = phase_completion.get(&pred) {
                latest_end = latest_end.max(pred_end);
            }
        }
        let mut candidate = add_business_days(latest_end, lead_days);
        while taken.contains(&candidate) {
            candidate = add_business_days(candidate, 1);
        }
        taken.insert(candidate);

        let prerequisites_met = tasks
            .iter()
            .filter(|t| t.phase == phase)
            .all(|t| t.status == TaskStatus::Completed);

        schedules.push(InspectionSchedule {
            id: InspectionId::generate(),
            project_id: project_id.clone(),
            inspection_type,
            required_for_phase: phase,
            optimal_date: candidate,
            prerequisites_met,
            auto_scheduled: true,
        });
    }

    schedules
}

/// Latest end date per phase, over tasks with well-formed dates.
fn phase_completion_dates(tasks: &[Task]) -> HashMap<Phase, NaiveDate> {
    let mut completion: HashMap<Phase, NaiveDate> = HashMap::new();
    for task in tasks {
        if let Some(end) = task.end_date {
            completion
                .entry(task.phase)
                .and_modify(|d| *d = (*d).max(end))
                .or_insert(end);
        }
    }
    completion
}
