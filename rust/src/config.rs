//! Configuration for the refinement search.

use pyo3::prelude::*;
use std::time::Duration;

/// Search behaviour: time budget, candidate space, parallelism, logging.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Wall-clock budget in seconds; None searches the whole space
    #[pyo3(get, set)]
    pub time_limit_secs: Option<f64>,
    /// Also allow leaving unresolved pairs open (partial refinements)
    #[pyo3(get, set)]
    pub allow_partial: bool,
    /// Fold dominance-forced edges into the relation before searching
    #[pyo3(get, set)]
    pub use_dominance: bool,
    /// Worker threads; 0 and 1 both mean single-threaded
    #[pyo3(get, set)]
    pub threads: usize,
    /// Verbosity level: 0=silent, 1=improvements, 2=progress, 3=debug
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: None,
            allow_partial: false,
            use_dominance: false,
            threads: 1,
            verbosity: 0,
        }
    }
}

impl SearchConfig {
    /// Time budget as a `Duration`. Negative or NaN limits mean "already
    /// expired"; None means unbounded.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO))
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_secs = Some(limit.as_secs_f64());
        self
    }

    pub fn with_partial(mut self, allow_partial: bool) -> Self {
        self.allow_partial = allow_partial;
        self
    }

    pub fn with_dominance(mut self, use_dominance: bool) -> Self {
        self.use_dominance = use_dominance;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Effective worker count (at least 1).
    pub fn worker_count(&self) -> usize {
        self.threads.max(1)
    }
}

#[pymethods]
impl SearchConfig {
    #[new]
    #[pyo3(signature = (
        time_limit_secs=None,
        allow_partial=None,
        use_dominance=None,
        threads=None,
        verbosity=None
    ))]
    fn new(
        time_limit_secs: Option<f64>,
        allow_partial: Option<bool>,
        use_dominance: Option<bool>,
        threads: Option<usize>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            time_limit_secs,
            allow_partial: allow_partial.unwrap_or(defaults.allow_partial),
            use_dominance: use_dominance.unwrap_or(defaults.use_dominance),
            threads: threads.unwrap_or(defaults.threads),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SearchConfig(time_limit_secs={:?}, allow_partial={}, use_dominance={}, threads={})",
            self.time_limit_secs, self.allow_partial, self.use_dominance, self.threads
        )
    }
}
