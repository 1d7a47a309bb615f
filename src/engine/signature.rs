//! Stable conflict signatures for idempotent detection and resolution.

use sha2::{Digest, Sha256};

use crate::api::{ConflictType, TaskId};

/// Compute the signature of a conflict: SHA-256 over its type and the
/// sorted affected task ids.
///
/// Conflict ids are regenerated on every detection run; the signature is the
/// stable key used for dedup, persistence, and resolution.
pub fn conflict_signature(conflict_type: ConflictType, affected_tasks: &[TaskId]) -> String {
    let mut ids: Vec<&str> = affected_tasks.iter().map(|t| t.value()).collect();
    ids.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(conflict_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(ids.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_order_independent() {
        let a = conflict_signature(
            ConflictType::TradeOverlap,
            &[TaskId::new("t1"), TaskId::new("t2")],
        );
        let b = conflict_signature(
            ConflictType::TradeOverlap,
            &[TaskId::new("t2"), TaskId::new("t1")],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_distinguishes_type() {
        let tasks = [TaskId::new("t1"), TaskId::new("t2")];
        let overlap = conflict_signature(ConflictType::TradeOverlap, &tasks);
        let sequence = conflict_signature(ConflictType::SequenceViolation, &tasks);
        assert_ne!(overlap, sequence);
    }

    #[test]
    fn test_signature_distinguishes_tasks() {
        let a = conflict_signature(ConflictType::TradeOverlap, &[TaskId::new("t1")]);
        let b = conflict_signature(ConflictType::TradeOverlap, &[TaskId::new("t2")]);
        assert_ne!(a, b);
    }
}
