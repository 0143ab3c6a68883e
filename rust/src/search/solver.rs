//! Refinement search driver: preprocessing, baseline, workers, result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use thiserror::Error;

use crate::config::SearchConfig;
use crate::dominance::fold_dominance;
use crate::models::Instance;
use crate::order::Closure;
use crate::schedule::ScheduleError;
use crate::{log_improvement, log_progress};

use super::best::{BestCandidate, CandidateKey};
use super::deadline::{Clock, Deadline};
use super::enumerate::SearchSpace;
use super::types::{SearchResult, SearchStats, WorkerStats};

/// Upper bound on the number of partitions handed out to threads.
const MAX_PARTITIONS: usize = 1 << 16;

/// Partitions handed out per worker, for load balance.
const PARTITIONS_PER_WORKER: usize = 4;

/// Errors that abort a search before it starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Initial relation cannot be scheduled: {0}")]
    Unschedulable(#[from] ScheduleError),
}

/// Anytime search for the refinement with the lowest expected makespan.
pub struct RefinementSearch<'a> {
    instance: &'a Instance,
    config: SearchConfig,
}

impl<'a> RefinementSearch<'a> {
    pub fn new(instance: &'a Instance, config: SearchConfig) -> Self {
        Self { instance, config }
    }

    /// Run the search, measuring time with `clock`.
    ///
    /// The baseline (initial relation) is always scored first, so a result
    /// exists even if the deadline has already passed.
    pub fn run(&self, clock: &dyn Clock) -> Result<SearchResult, SearchError> {
        let verbosity = self.config.verbosity;
        let deadline = Deadline::new(clock, self.config.time_limit());
        let n = self.instance.n();

        let (base, base_closure, folded) = if self.config.use_dominance {
            fold_dominance(self.instance)
        } else {
            let relation = self.instance.initial_relation().clone();
            let closure = Closure::from_relation(&relation, n);
            (relation, closure, 0)
        };
        log_progress!(verbosity, "Dominance preprocessing folded {} edges", folded);

        let space = SearchSpace::new(
            self.instance,
            base,
            base_closure,
            self.config.allow_partial,
            verbosity,
        );

        let best = BestCandidate::new();
        let initial = self.instance.initial_relation();
        let baseline_makespan = space.score(initial)?;
        best.offer(
            baseline_makespan,
            CandidateKey::Baseline,
            deadline.elapsed_secs(),
            || initial.clone(),
        );
        log_improvement!(
            verbosity,
            "Baseline expected makespan {:.6}, {} unresolved pairs",
            baseline_makespan,
            space.depth()
        );

        let mut stats = SearchStats {
            unresolved_pairs: space.depth(),
            dominance_edges: folded,
            candidates_evaluated: 1,
            ..SearchStats::default()
        };

        if !space.is_trivial() {
            for worker in self.explore(&space, &best, &deadline) {
                stats.absorb(&worker);
            }
        }

        let timed_out = deadline.was_hit();
        stats.elapsed_secs = deadline.elapsed_secs();

        let (winner, improvements, history) = best.into_parts();
        stats.improvements = improvements;
        let (relation, expected_makespan) = match winner {
            Some(candidate) => (candidate.relation, candidate.cost),
            None => (initial.clone(), baseline_makespan),
        };
        let added_edges = relation
            .edges()
            .iter()
            .copied()
            .filter(|&(a, b)| !initial.contains(a, b))
            .collect();

        log_improvement!(
            verbosity,
            "Search {} after {:.3}s: expected makespan {:.6} ({} candidates, {} cycles pruned)",
            if timed_out { "timed out" } else { "finished" },
            stats.elapsed_secs,
            expected_makespan,
            stats.candidates_evaluated,
            stats.cycles_pruned
        );

        Ok(SearchResult {
            relation,
            added_edges,
            expected_makespan,
            baseline_makespan,
            optimal: !timed_out,
            timed_out,
            stats,
            history,
        })
    }

    /// Walk every partition, on scoped threads when more than one worker is
    /// configured. Returns per-worker counters.
    fn explore(
        &self,
        space: &SearchSpace<'_>,
        best: &BestCandidate,
        deadline: &Deadline<'_>,
    ) -> Vec<WorkerStats> {
        let workers = self.config.worker_count();
        let prefix_len = prefix_len(workers, space.depth(), space.branching());
        let partitions = space.partition_count(prefix_len);
        let next = AtomicUsize::new(0);

        log_progress!(
            self.config.verbosity,
            "Exploring {} unresolved pairs ({}-way) as {} partitions on {} workers",
            space.depth(),
            space.branching(),
            partitions,
            workers
        );

        let run_worker = || {
            let mut stats = WorkerStats::default();
            loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= partitions || deadline.expired() {
                    break;
                }
                space.explore_partition(index, prefix_len, best, deadline, &mut stats);
            }
            stats
        };

        if workers == 1 {
            return vec![run_worker()];
        }

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers).map(|_| scope.spawn(&run_worker)).collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(stats) => stats,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }
}

/// Prefix length giving at least `PARTITIONS_PER_WORKER` partitions per
/// worker, capped by the tree depth and `MAX_PARTITIONS`.
fn prefix_len(workers: usize, depth: usize, branching: usize) -> usize {
    if workers <= 1 {
        return 0;
    }
    let wanted = workers.saturating_mul(PARTITIONS_PER_WORKER);
    let mut len = 0;
    let mut partitions = 1usize;
    while partitions < wanted && len < depth && partitions * branching <= MAX_PARTITIONS {
        partitions *= branching;
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_len() {
        assert_eq!(prefix_len(1, 20, 2), 0);
        assert_eq!(prefix_len(2, 20, 2), 3);
        assert_eq!(prefix_len(4, 20, 2), 4);
        assert_eq!(prefix_len(4, 2, 2), 2);
        assert_eq!(prefix_len(1 << 20, 40, 2), 16);
    }

    #[test]
    fn test_prefix_len_ternary() {
        // 9 >= 8 partitions for 2 workers, 27 >= 16 for 4
        assert_eq!(prefix_len(2, 20, 3), 2);
        assert_eq!(prefix_len(4, 20, 3), 3);
        // 3^10 = 59049 fits under the cap, 3^11 does not
        assert_eq!(prefix_len(1 << 20, 40, 3), 10);
    }
}
