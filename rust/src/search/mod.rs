//! Anytime search over refinements of the initial precedence relation.
//!
//! Every unresolved pair is given one of two orientations, in a fixed order,
//! or with `allow_partial` may also be left open. Each acyclic result is
//! scored by its expected makespan. The search
//! returns the lowest-scoring refinement found, ties going to the candidate
//! found first in depth-first pre-order (the unrefined baseline before all
//! others). With no deadline the whole space is walked and the answer is
//! optimal; otherwise the best-so-far is returned with `timed_out` set.

mod best;
mod deadline;
mod enumerate;
mod solver;
mod types;

pub use best::{BestCandidate, Candidate, CandidateKey, Choice};
pub use deadline::{Clock, Deadline, SystemClock};
pub use enumerate::SearchSpace;
pub use solver::{RefinementSearch, SearchError};
pub use types::{SearchResult, SearchStats, SearchStatus, WorkerStats};

use crate::config::SearchConfig;
use crate::models::Instance;

/// Search for the refinement minimizing expected makespan.
pub fn solve(instance: &Instance, config: &SearchConfig) -> Result<SearchResult, SearchError> {
    solve_with_clock(instance, config, &SystemClock::start())
}

/// [`solve`] with an injected clock.
pub fn solve_with_clock(
    instance: &Instance,
    config: &SearchConfig,
    clock: &dyn Clock,
) -> Result<SearchResult, SearchError> {
    RefinementSearch::new(instance, config.clone()).run(clock)
}
