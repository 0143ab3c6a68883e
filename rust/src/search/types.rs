//! Result and statistics types for the refinement search.

use pyo3::prelude::*;

use crate::models::PrecedenceRelation;

/// How the search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// Every candidate in the space was scored.
    Optimal,
    /// The deadline expired first; the result is the best seen so far.
    TimedOut,
}

/// Counters from a single worker; absorbed into [`SearchStats`] at the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub nodes_expanded: u64,
    pub candidates_evaluated: u64,
    pub cycles_pruned: u64,
    pub schedule_failures: u64,
}

/// Search effort summary.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct SearchStats {
    /// Unresolved pairs left after preprocessing (depth of the choice tree).
    #[pyo3(get)]
    pub unresolved_pairs: usize,
    /// Edges folded in by dominance preprocessing.
    #[pyo3(get)]
    pub dominance_edges: usize,
    #[pyo3(get)]
    pub nodes_expanded: u64,
    /// Candidates scored, baseline included.
    #[pyo3(get)]
    pub candidates_evaluated: u64,
    /// Orientations discarded because they closed a cycle.
    #[pyo3(get)]
    pub cycles_pruned: u64,
    /// Candidates whose schedule could not be built (absorbed, never raised).
    #[pyo3(get)]
    pub schedule_failures: u64,
    /// Times the best-so-far was replaced, baseline included.
    #[pyo3(get)]
    pub improvements: u64,
    #[pyo3(get)]
    pub elapsed_secs: f64,
}

impl SearchStats {
    pub fn absorb(&mut self, worker: &WorkerStats) {
        self.nodes_expanded += worker.nodes_expanded;
        self.candidates_evaluated += worker.candidates_evaluated;
        self.cycles_pruned += worker.cycles_pruned;
        self.schedule_failures += worker.schedule_failures;
    }
}

#[pymethods]
impl SearchStats {
    fn __repr__(&self) -> String {
        format!(
            "SearchStats(pairs={}, expanded={}, evaluated={}, pruned={}, elapsed={:.3}s)",
            self.unresolved_pairs,
            self.nodes_expanded,
            self.candidates_evaluated,
            self.cycles_pruned,
            self.elapsed_secs
        )
    }
}

/// Outcome of [`solve`](super::solve).
#[pyclass]
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// Best refinement found; always acyclic and an extension of the
    /// initial relation.
    pub relation: PrecedenceRelation,
    /// Edges of `relation` that are not in the initial relation.
    #[pyo3(get)]
    pub added_edges: Vec<(usize, usize)>,
    #[pyo3(get)]
    pub expected_makespan: f64,
    /// Expected makespan of the unrefined initial relation.
    #[pyo3(get)]
    pub baseline_makespan: f64,
    #[pyo3(get)]
    pub optimal: bool,
    #[pyo3(get)]
    pub timed_out: bool,
    #[pyo3(get)]
    pub stats: SearchStats,
    /// `(elapsed_secs, expected_makespan)` at every improvement.
    #[pyo3(get)]
    pub history: Vec<(f64, f64)>,
}

impl SearchResult {
    pub fn status(&self) -> SearchStatus {
        if self.timed_out {
            SearchStatus::TimedOut
        } else {
            SearchStatus::Optimal
        }
    }
}

#[pymethods]
impl SearchResult {
    #[getter(relation)]
    fn py_relation(&self) -> Vec<(usize, usize)> {
        self.relation.edges().to_vec()
    }

    fn __repr__(&self) -> String {
        format!(
            "SearchResult(expected_makespan={}, added_edges={}, optimal={}, timed_out={})",
            self.expected_makespan,
            self.added_edges.len(),
            self.optimal,
            self.timed_out
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_absorb_workers() {
        let worker = WorkerStats {
            nodes_expanded: 3,
            candidates_evaluated: 2,
            cycles_pruned: 1,
            schedule_failures: 0,
        };
        let mut stats = SearchStats::default();
        stats.absorb(&worker);
        stats.absorb(&worker);
        assert_eq!(stats.nodes_expanded, 6);
        assert_eq!(stats.candidates_evaluated, 4);
        assert_eq!(stats.cycles_pruned, 2);
    }

    #[test]
    fn test_status_from_flags() {
        let result = SearchResult {
            relation: PrecedenceRelation::new(),
            added_edges: vec![],
            expected_makespan: 1.0,
            baseline_makespan: 1.0,
            optimal: false,
            timed_out: true,
            stats: SearchStats::default(),
            history: vec![],
        };
        assert_eq!(result.status(), SearchStatus::TimedOut);
    }
}
