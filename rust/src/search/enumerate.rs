//! Backtracking walk over decisions for unresolved pairs.
//!
//! The choice tree has one level per unresolved pair, in the fixed order of
//! [`Closure::unresolved_pairs`]. Each pair `(a, b)` is oriented `a -> b`
//! ([`Choice::Forward`]) or `b -> a` ([`Choice::Reverse`]), and with partial
//! refinements enabled may also be left open ([`Choice::Open`]). Leaves are
//! the candidates. The frontier is an explicit stack of frames; each frame
//! owns the closure of its refinement so a cycle is detected the moment an
//! orientation closes one.
//!
//! The tree is cut into `b^p` partitions by the first `p` choices, `b` being
//! the branching factor. Partition `i` covers the subtree under the path
//! spelled by the base-`b` digits of `i`, most significant first, so
//! partition order matches pre-order.

use crate::models::{Instance, PrecedenceRelation};
use crate::order::Closure;
use crate::risk::expected_makespan;
use crate::schedule::{earliest_start_schedule, ScheduleError};
use crate::{log_debug, log_improvement};

use super::best::{BestCandidate, CandidateKey, Choice};
use super::deadline::Deadline;
use super::types::WorkerStats;

const ORIENTATIONS: [Choice; 2] = [Choice::Forward, Choice::Reverse];
const WITH_OPEN: [Choice; 3] = [Choice::Forward, Choice::Reverse, Choice::Open];

/// One node of the choice tree.
#[derive(Clone)]
struct Frame {
    /// Index of the next pair to decide; also the depth.
    cursor: usize,
    path: Vec<Choice>,
    /// Edges added on top of the base relation (redundant ones skipped).
    added: Vec<(usize, usize)>,
    /// At least one pair on the path was oriented.
    oriented: bool,
    closure: Closure,
}

/// Read-only description of the space shared by all workers.
pub struct SearchSpace<'a> {
    instance: &'a Instance,
    /// Initial relation plus any preprocessing edges.
    base: PrecedenceRelation,
    base_closure: Closure,
    pairs: Vec<(usize, usize)>,
    allow_partial: bool,
    /// The base differs from the baseline and is a candidate in its own right.
    root_is_candidate: bool,
    verbosity: u8,
}

/// Outcome of applying one choice to a frame.
enum Step {
    Child(Frame),
    Cycle,
    /// Leaving an already ordered pair open; the orientation it agrees with
    /// yields the same relation.
    Pruned,
}

impl<'a> SearchSpace<'a> {
    pub fn new(
        instance: &'a Instance,
        base: PrecedenceRelation,
        base_closure: Closure,
        allow_partial: bool,
        verbosity: u8,
    ) -> Self {
        let pairs = base_closure.unresolved_pairs();
        let root_is_candidate = base != *instance.initial_relation();
        Self {
            instance,
            base,
            base_closure,
            pairs,
            allow_partial,
            root_is_candidate,
            verbosity,
        }
    }

    /// Number of unresolved pairs, i.e. the depth of the tree.
    pub fn depth(&self) -> usize {
        self.pairs.len()
    }

    /// Children per node: 3 with partial refinements, otherwise 2.
    pub fn branching(&self) -> usize {
        self.choices().len()
    }

    /// Number of partitions cut by the first `prefix_len` choices.
    pub fn partition_count(&self, prefix_len: usize) -> usize {
        (0..prefix_len).fold(1, |count, _| count * self.branching())
    }

    /// True if the tree holds no candidate besides the baseline.
    pub fn is_trivial(&self) -> bool {
        self.pairs.is_empty() && !self.root_is_candidate
    }

    /// Score a relation: earliest-start schedule, then expected makespan.
    pub fn score(&self, relation: &PrecedenceRelation) -> Result<f64, ScheduleError> {
        let schedule =
            earliest_start_schedule(self.instance.n(), self.instance.durations(), relation)?;
        Ok(expected_makespan(
            &schedule,
            self.instance.durations(),
            self.instance.ko_probabilities(),
        ))
    }

    fn choices(&self) -> &'static [Choice] {
        if self.allow_partial {
            &WITH_OPEN
        } else {
            &ORIENTATIONS
        }
    }

    /// Leaves are candidates, except the one leaving every pair open when
    /// that is just the baseline again.
    fn is_candidate(&self, frame: &Frame) -> bool {
        frame.cursor == self.pairs.len() && (frame.oriented || self.root_is_candidate)
    }

    fn relation_for(&self, added: &[(usize, usize)]) -> PrecedenceRelation {
        self.base.extended(added.iter().copied())
    }

    fn apply(&self, frame: &Frame, choice: Choice) -> Step {
        let (a, b) = self.pairs[frame.cursor];
        let (from, to) = match choice {
            Choice::Forward => (a, b),
            Choice::Reverse => (b, a),
            Choice::Open => {
                if !frame.closure.is_unresolved(a, b) {
                    return Step::Pruned;
                }
                let mut child = frame.clone();
                child.cursor += 1;
                child.path.push(choice);
                return Step::Child(child);
            }
        };

        if frame.closure.reaches(to, from) {
            return Step::Cycle;
        }
        let mut child = frame.clone();
        child.cursor += 1;
        child.path.push(choice);
        child.oriented = true;
        if !child.closure.reaches(from, to) {
            child.closure.add_edge(from, to);
            child.added.push((from, to));
        }
        Step::Child(child)
    }

    /// Score `frame` if it is a candidate and offer it to `best`.
    fn visit(
        &self,
        frame: &Frame,
        best: &BestCandidate,
        deadline: &Deadline,
        stats: &mut WorkerStats,
    ) {
        if !self.is_candidate(frame) {
            return;
        }
        let relation = self.relation_for(&frame.added);
        match self.score(&relation) {
            Ok(cost) => {
                stats.candidates_evaluated += 1;
                log_debug!(self.verbosity, "  candidate {:?}: {}", frame.path, cost);
                let key = CandidateKey::Node(frame.path.clone());
                if best.offer(cost, key, deadline.elapsed_secs(), || relation) {
                    log_improvement!(
                        self.verbosity,
                        "New best {:.6} after {} candidates (+{} edges)",
                        cost,
                        stats.candidates_evaluated,
                        frame.added.len()
                    );
                }
            }
            Err(err) => {
                stats.schedule_failures += 1;
                log_debug!(self.verbosity, "  candidate {:?} rejected: {}", frame.path, err);
            }
        }
    }

    /// Explore partition `index` of the
    /// [`partition_count`](Self::partition_count) cut by `prefix_len`.
    ///
    /// Returns early, leaving work undone, once the deadline expires.
    pub fn explore_partition(
        &self,
        index: usize,
        prefix_len: usize,
        best: &BestCandidate,
        deadline: &Deadline,
        stats: &mut WorkerStats,
    ) {
        let branching = self.branching();
        let mut frame = Frame {
            cursor: 0,
            path: Vec::with_capacity(self.pairs.len()),
            added: Vec::new(),
            oriented: false,
            closure: self.base_closure.clone(),
        };

        // Walk down the prefix. Nodes above the partition root belong to the
        // leftmost partition below them: the one whose remaining digits are
        // all zero.
        for depth in 0..prefix_len {
            if owns_ancestor(index, prefix_len, depth, branching) {
                stats.nodes_expanded += 1;
                self.visit(&frame, best, deadline, stats);
            }
            let digit = index / branching.pow((prefix_len - 1 - depth) as u32) % branching;
            match self.apply(&frame, self.choices()[digit]) {
                Step::Child(child) => frame = child,
                Step::Cycle => {
                    if owns_ancestor(index, prefix_len, depth + 1, branching) {
                        stats.cycles_pruned += 1;
                    }
                    return;
                }
                Step::Pruned => return,
            }
        }

        let mut stack = vec![frame];
        while let Some(frame) = stack.pop() {
            if deadline.expired() {
                return;
            }
            stats.nodes_expanded += 1;
            self.visit(&frame, best, deadline, stats);

            if frame.cursor == self.pairs.len() {
                continue;
            }
            // Push in reverse so the first choice is explored first.
            for &choice in self.choices().iter().rev() {
                match self.apply(&frame, choice) {
                    Step::Child(child) => stack.push(child),
                    Step::Cycle => stats.cycles_pruned += 1,
                    Step::Pruned => {}
                }
            }
        }
    }
}

/// Whether partition `index` owns the prefix node at `depth`.
fn owns_ancestor(index: usize, prefix_len: usize, depth: usize, branching: usize) -> bool {
    let remaining = (prefix_len - depth) as u32;
    index % branching.pow(remaining) == 0
}
