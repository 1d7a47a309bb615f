//! Trade-sequencing optimization.
//!
//! Builds the task dependency graph from the phase-ordering rules, computes
//! the critical path (longest dependency-weighted chain), and proposes
//! overlap and buffer-compression actions. The proposed completion date is
//! never earlier than the critical-path floor.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use log::debug;

use crate::api::{
    InspectionSchedule, OptimizationAction, OptimizationType, OptimizedSchedule, TaskId,
};
use crate::engine::EngineError;
use crate::models::{PhaseOrderingRules, Task};

/// Task dependency graph over datable tasks.
///
/// Edge j -> i exists when task i's phase requires task j's phase as a
/// predecessor and j starts strictly before i.
struct DepGraph<'a> {
    nodes: Vec<&'a Task>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
}

impl<'a> DepGraph<'a> {
    fn build(tasks: &'a [Task], rules: &PhaseOrderingRules) -> Self {
        // Deterministic node order: by start date, then id. Tasks without
        // well-formed dates are excluded (fail soft).
        let mut nodes: Vec<&Task> = tasks.iter().filter(|t| t.has_valid_dates()).collect();
        nodes.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));

        let n = nodes.len();
        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (succ, pred) = (nodes[i], nodes[j]);
                if pred.project_id == succ.project_id
                    && rules.requires(succ.phase, pred.phase)
                    && pred.start_date < succ.start_date
                {
                    preds[i].push(j);
                    succs[j].push(i);
                }
            }
        }
        Self { nodes, preds, succs }
    }

    fn has_edge(&self, a: usize, b: usize) -> bool {
        self.succs[a].contains(&b) || self.succs[b].contains(&a)
    }

    /// Kahn topological order. Errors on a cycle rather than producing a
    /// silently wrong critical path.
    fn topo_order(&self) -> Result<Vec<usize>, EngineError> {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = self.preds.iter().map(|p| p.len()).collect();
        let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(i) = ready.pop() {
            order.push(i);
            for &s in &self.succs[i] {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    ready.push(s);
                }
            }
        }

        if order.len() < n {
            let stuck: Vec<String> = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].id.value().to_string())
                .collect();
            return Err(EngineError::GraphCycle {
                tasks: stuck.join(", "),
            });
        }
        Ok(order)
    }
}

/// Compute the optimized schedule for a project snapshot.
pub fn optimize(
    tasks: &[Task],
    inspections: &[InspectionSchedule],
    rules: &PhaseOrderingRules,
) -> Result<OptimizedSchedule, EngineError> {
    let graph = DepGraph::build(tasks, rules);
    if graph.nodes.is_empty() {
        return Ok(OptimizedSchedule::empty());
    }

    let order = graph.topo_order()?;

    // Longest path by inclusive task duration.
    let n = graph.nodes.len();
    let durations: Vec<i64> = graph
        .nodes
        .iter()
        .map(|t| t.duration_days().expect("graph nodes have valid dates"))
        .collect();
    let mut finish = vec![0i64; n];
    let mut best_pred: Vec<Option<usize>> = vec![None; n];
    for &i in &order {
        let mut upstream = 0;
        for &p in &graph.preds[i] {
            if best_pred[i].is_none() || finish[p] > upstream {
                upstream = finish[p];
                best_pred[i] = Some(p);
            }
        }
        finish[i] = upstream + durations[i];
    }

    // Chain tail: longest finish, ties broken by task id for determinism.
    let mut tail = 0;
    for i in 1..n {
        if finish[i] > finish[tail]
            || (finish[i] == finish[tail] && graph.nodes[i].id < graph.nodes[tail].id)
        {
            tail = i;
        }
    }
    let critical_len = finish[tail];

    // Reconstruct the critical chain.
    let mut critical_path = Vec::new();
    let mut cursor = Some(tail);
    while let Some(i) = cursor {
        critical_path.push(i);
        cursor = best_pred[i];
    }
    critical_path.reverse();
    let critical_set: HashSet<usize> = critical_path.iter().copied().collect();

    let project_start = graph
        .nodes
        .iter()
        .filter_map(|t| t.start_date)
        .min()
        .expect("graph nodes have valid dates");
    let floor_date = project_start + Duration::days(critical_len - 1);

    let total_duration: i64 = durations.iter().sum();
    let naive_completion = project_start + Duration::days(total_duration - 1);

    let mut actions = Vec::new();
    propose_parallel_overlaps(&graph, &critical_set, &mut actions);
    propose_buffer_compression(&graph, inspections, &mut actions);

    // Deterministic ordering: earliest affected task start first.
    actions.sort_by_key(|(start, _)| *start);
    let actions: Vec<OptimizationAction> = actions.into_iter().map(|(_, a)| a).collect();

    let estimated_time_saved: i64 = actions.iter().map(|a| a.time_impact).sum();
    let new_completion_date = (naive_completion - Duration::days(estimated_time_saved)).max(floor_date);

    debug!(
        "optimizer: {} actions, {} day(s) saved, floor {}",
        actions.len(),
        estimated_time_saved,
        floor_date
    );

    Ok(OptimizedSchedule {
        optimizations_applied: actions,
        estimated_time_saved,
        new_completion_date: Some(new_completion_date),
        critical_path_floor: Some(floor_date),
        critical_path: critical_path
            .iter()
            .map(|&i| graph.nodes[i].id.clone())
            .collect(),
    })
}

/// Earliest start a task could be pulled back to, bounded by its own
/// prerequisite tasks in the graph.
fn earliest_allowed_start(graph: &DepGraph<'_>, i: usize) -> Option<NaiveDate> {
    graph.preds[i]
        .iter()
        .filter_map(|&p| graph.nodes[p].end_date)
        .max()
        .map(|end| end + Duration::days(1))
}

/// Propose running sequentially-scheduled non-critical tasks of different
/// trades in parallel.
fn propose_parallel_overlaps(
    graph: &DepGraph<'_>,
    critical_set: &HashSet<usize>,
    out: &mut Vec<(NaiveDate, OptimizationAction)>,
) {
    let n = graph.nodes.len();
    for b in 0..n {
        if critical_set.contains(&b) {
            continue;
        }
        let later = graph.nodes[b];
        let (Some(later_trade), Some(later_start)) = (&later.assigned_trade, later.start_date)
        else {
            continue;
        };

        // Best partner: the one allowing the largest pull-back; ties go to
        // the earliest-starting partner.
        let mut best: Option<(i64, usize, NaiveDate)> = None;
        for a in 0..n {
            if a == b || critical_set.contains(&a) || graph.has_edge(a, b) {
                continue;
            }
            let earlier = graph.nodes[a];
            let Some(earlier_trade) = &earlier.assigned_trade else {
                continue;
            };
            if earlier_trade == later_trade
                || earlier.project_id != later.project_id
                || earlier.end_date.unwrap() >= later_start
            {
                continue;
            }

            let mut new_start = earlier.start_date.unwrap();
            if let Some(bound) = earliest_allowed_start(graph, b) {
                new_start = new_start.max(bound);
            }
            let reclaimed = (later_start - new_start).num_days();
            if reclaimed <= 0 {
                continue;
            }
            let candidate = (reclaimed, a, new_start);
            let better = match &best {
                None => true,
                Some((r, i, _)) => {
                    reclaimed > *r
                        || (reclaimed == *r
                            && graph.nodes[a].start_date < graph.nodes[*i].start_date)
                }
            };
            if better {
                best = Some(candidate);
            }
        }

        if let Some((reclaimed, a, new_start)) = best {
            let earlier = graph.nodes[a];
            let affected_start = earlier.start_date.unwrap().min(later_start);
            out.push((
                affected_start,
                OptimizationAction {
                    action_type: OptimizationType::OverlapParallelTrades,
                    description: format!(
                        "Run '{}' ({}) in parallel with '{}' ({}), starting {}",
                        later.name,
                        later_trade,
                        earlier.name,
                        earlier.assigned_trade.as_ref().unwrap(),
                        new_start
                    ),
                    tasks_affected: vec![earlier.id.clone(), later.id.clone()],
                    time_impact: reclaimed,
                },
            ));
        }
    }
}

/// Propose compressing slack exceeding one day between a task and its
/// binding prerequisite, unless an inspection sits inside the gap.
fn propose_buffer_compression(
    graph: &DepGraph<'_>,
    inspections: &[InspectionSchedule],
    out: &mut Vec<(NaiveDate, OptimizationAction)>,
) {
    for (i, &node) in graph.nodes.iter().enumerate() {
        if graph.preds[i].is_empty() {
            continue;
        }
        let start = node.start_date.unwrap();
        let binding = graph.preds[i]
            .iter()
            .max_by_key(|&&p| graph.nodes[p].end_date)
            .copied()
            .unwrap();
        let binding_end = graph.nodes[binding].end_date.unwrap();

        // Days strictly between the prerequisite's end and this start.
        let gap = (start - binding_end).num_days() - 1;
        if gap <= 1 {
            continue;
        }
        let inspection_in_gap = inspections.iter().any(|insp| {
            insp.project_id == node.project_id
                && insp.optimal_date > binding_end
                && insp.optimal_date < start
        });
        if inspection_in_gap {
            continue;
        }

        let saved = gap - 1;
        out.push((
            graph.nodes[binding].start_date.unwrap().min(start),
            OptimizationAction {
                action_type: OptimizationType::CompressBuffer,
                description: format!(
                    "Compress the {} day gap between '{}' and '{}' to a one day buffer",
                    gap, graph.nodes[binding].name, node.name
                ),
                tasks_affected: vec![graph.nodes[binding].id.clone(), node.id.clone()],
                time_impact: saved,
            },
        ));
    }
}
