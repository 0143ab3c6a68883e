//! Earliest-start schedules from precedence relations.

use std::collections::VecDeque;
use thiserror::Error;

use crate::models::PrecedenceRelation;

/// Errors from building a schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Precedence relation contains a cycle ({scheduled} of {total} activities schedulable)")]
    CycleDetected { scheduled: usize, total: usize },
    #[error("Precedence ({0}, {1}) references an activity outside 0..{2}")]
    EdgeOutOfRange(usize, usize, usize),
    #[error("Got {durations} durations for {n} activities")]
    LengthMismatch { durations: usize, n: usize },
}

/// Start time per activity, indexed by activity id.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    starts: Vec<f64>,
}

impl Schedule {
    pub fn from_starts(starts: Vec<f64>) -> Self {
        Self { starts }
    }

    pub fn starts(&self) -> &[f64] {
        &self.starts
    }

    /// Finish time per activity.
    ///
    /// # Panics
    /// If `durations` has fewer entries than the schedule has activities.
    pub fn finishes(&self, durations: &[f64]) -> Vec<f64> {
        self.starts
            .iter()
            .enumerate()
            .map(|(activity, start)| start + durations[activity])
            .collect()
    }

    /// Latest finish time, 0 for an empty schedule.
    ///
    /// # Panics
    /// If `durations` has fewer entries than the schedule has activities.
    pub fn makespan(&self, durations: &[f64]) -> f64 {
        self.finishes(durations).into_iter().fold(0.0, f64::max)
    }
}

/// Compute the earliest-start schedule using Kahn's algorithm.
///
/// Each activity starts at the latest finish of its direct predecessors (or
/// 0). An activity is dequeued only after all of its predecessors are
/// finalized, so its start is a max over fixed values: the order in which
/// ready activities leave the queue never changes the result.
///
/// # Returns
/// * `Ok(Schedule)` with one start time per activity
/// * `Err(ScheduleError::CycleDetected)` if the relation is not a DAG
pub fn earliest_start_schedule(
    n: usize,
    durations: &[f64],
    relation: &PrecedenceRelation,
) -> Result<Schedule, ScheduleError> {
    if durations.len() != n {
        return Err(ScheduleError::LengthMismatch {
            durations: durations.len(),
            n,
        });
    }
    if let Some((a, b)) = relation.edge_out_of_range(n) {
        return Err(ScheduleError::EdgeOutOfRange(a, b, n));
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for &(a, b) in relation.edges() {
        successors[a].push(b);
        predecessors[b].push(a);
        in_degree[b] += 1;
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&a| in_degree[a] == 0).collect();
    let mut starts = vec![0.0; n];
    let mut scheduled = 0usize;

    while let Some(a) = queue.pop_front() {
        starts[a] = predecessors[a]
            .iter()
            .map(|&p| starts[p] + durations[p])
            .fold(0.0, f64::max);
        scheduled += 1;

        for &b in &successors[a] {
            in_degree[b] -= 1;
            if in_degree[b] == 0 {
                queue.push_back(b);
            }
        }
    }

    if scheduled != n {
        return Err(ScheduleError::CycleDetected {
            scheduled,
            total: n,
        });
    }

    Ok(Schedule { starts })
}
