//! Task and trade domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::phase::Phase;
use crate::api::{ProjectId, TaskId};

/// Lifecycle status of a construction task.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        };
        write!(f, "{}", name)
    }
}

/// Craft/crew type assigned to a task (electrical, plumbing, framing, ...).
///
/// Trades are open-ended user data, unlike phases, so this is a newtype over
/// the raw name rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trade(pub String);

impl Trade {
    pub fn new(name: impl Into<String>) -> Self {
        Trade(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled unit of construction work.
///
/// Dates are optional on input: missing or inverted dates are reported as
/// data-integrity validation issues rather than rejected at parse time. The
/// engine never mutates tasks; it only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub phase: Phase,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_trade: Option<Trade>,
    #[serde(default)]
    pub inspection_required: bool,
    pub project_id: ProjectId,
}

impl Task {
    /// Both dates present and in order.
    pub fn has_valid_dates(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => end >= start,
            _ => false,
        }
    }

    /// Inclusive duration in days, when dates are well-formed.
    pub fn duration_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end >= start => {
                Some((end - start).num_days() + 1)
            }
            _ => None,
        }
    }

    /// Inclusive overlap in days between this task's window and another's.
    ///
    /// Returns `None` when either task has malformed dates, `Some(0)` when
    /// the windows do not intersect.
    pub fn overlap_days(&self, other: &Task) -> Option<i64> {
        if !self.has_valid_dates() || !other.has_valid_dates() {
            return None;
        }
        let start = self.start_date.unwrap().max(other.start_date.unwrap());
        let end = self.end_date.unwrap().min(other.end_date.unwrap());
        if end >= start {
            Some((end - start).num_days() + 1)
        } else {
            Some(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task {
            id: TaskId::new(id),
            name: id.to_string(),
            phase: Phase::Framing,
            start_date: Some(start),
            end_date: Some(end),
            status: TaskStatus::NotStarted,
            assigned_trade: None,
            inspection_required: false,
            project_id: ProjectId::new("p1"),
        }
    }

    #[test]
    fn test_duration_inclusive() {
        let t = task("a", date(2025, 5, 1), date(2025, 5, 10));
        assert_eq!(t.duration_days(), Some(10));
    }

    #[test]
    fn test_duration_single_day() {
        let t = task("a", date(2025, 5, 1), date(2025, 5, 1));
        assert_eq!(t.duration_days(), Some(1));
    }

    #[test]
    fn test_inverted_dates_invalid() {
        let t = task("a", date(2025, 5, 10), date(2025, 5, 1));
        assert!(!t.has_valid_dates());
        assert_eq!(t.duration_days(), None);
    }

    #[test]
    fn test_missing_dates_invalid() {
        let mut t = task("a", date(2025, 5, 1), date(2025, 5, 10));
        t.end_date = None;
        assert!(!t.has_valid_dates());
    }

    #[test]
    fn test_overlap_days() {
        let a = task("a", date(2025, 5, 8), date(2025, 5, 15));
        let b = task("b", date(2025, 5, 12), date(2025, 5, 18));
        assert_eq!(a.overlap_days(&b), Some(4));
        assert_eq!(b.overlap_days(&a), Some(4));
    }

    #[test]
    fn test_no_overlap() {
        let a = task("a", date(2025, 5, 1), date(2025, 5, 5));
        let b = task("b", date(2025, 5, 6), date(2025, 5, 9));
        assert_eq!(a.overlap_days(&b), Some(0));
    }

    #[test]
    fn test_task_serde_round_trip() {
        let t = task("a", date(2025, 5, 1), date(2025, 5, 10));
        let json = serde_json::to_string(&t).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, t.id);
        assert_eq!(back.start_date, t.start_date);
    }
}
