//! Best-so-far record shared between search workers.

use std::cmp::Ordering;
use std::sync::Mutex;

use crate::models::PrecedenceRelation;

/// Decision taken for one unresolved pair `(a, b)`, `a < b`.
///
/// Variant order is branch order: `Forward` is explored first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Choice {
    /// `a` before `b`.
    Forward,
    /// `b` before `a`.
    Reverse,
    /// Pair left unordered (partial refinements only).
    Open,
}

/// Position of a candidate in enumeration order.
///
/// The baseline (`Baseline`) comes before every tree node. Tree nodes are
/// ordered by their choice path compared lexicographically, with a prefix
/// before its extensions: exactly depth-first pre-order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CandidateKey {
    Baseline,
    Node(Vec<Choice>),
}

/// A scored, valid refinement.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub key: CandidateKey,
    pub relation: PrecedenceRelation,
    pub cost: f64,
}

/// Canonical candidate order: lower cost first, earlier enumeration
/// position on exact ties (first found wins).
fn beats(cost: f64, key: &CandidateKey, incumbent: &Candidate) -> bool {
    match cost.total_cmp(&incumbent.cost) {
        Ordering::Less => true,
        Ordering::Equal => *key < incumbent.key,
        Ordering::Greater => false,
    }
}

#[derive(Default)]
struct BestState {
    best: Option<Candidate>,
    improvements: u64,
    history: Vec<(f64, f64)>,
}

/// Mutex-guarded best candidate with compare-and-update semantics.
///
/// Because the order is total over (cost, key), the winner is the same no
/// matter which worker offers which candidate first.
#[derive(Default)]
pub struct BestCandidate {
    state: Mutex<BestState>,
}

impl BestCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the incumbent if `(cost, key)` beats it. The relation is only
    /// built when the offer is accepted.
    pub fn offer<F>(&self, cost: f64, key: CandidateKey, elapsed_secs: f64, relation: F) -> bool
    where
        F: FnOnce() -> PrecedenceRelation,
    {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(incumbent) = &state.best {
            if !beats(cost, &key, incumbent) {
                return false;
            }
        }
        state.best = Some(Candidate {
            key,
            relation: relation(),
            cost,
        });
        state.improvements += 1;
        state.history.push((elapsed_secs, cost));
        true
    }

    pub fn cost(&self) -> Option<f64> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.best.as_ref().map(|c| c.cost)
    }

    /// Consume the record: best candidate, improvement count, history.
    pub fn into_parts(self) -> (Option<Candidate>, u64, Vec<(f64, f64)>) {
        let state = self.state.into_inner().unwrap_or_else(|e| e.into_inner());
        (state.best, state.improvements, state.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: Choice = Choice::Forward;
    const R: Choice = Choice::Reverse;
    const O: Choice = Choice::Open;

    fn node(path: &[Choice]) -> CandidateKey {
        CandidateKey::Node(path.to_vec())
    }

    #[test]
    fn test_key_order_is_preorder() {
        assert!(CandidateKey::Baseline < node(&[]));
        assert!(node(&[]) < node(&[F]));
        assert!(node(&[F]) < node(&[F, R]));
        assert!(node(&[F, R]) < node(&[R]));
        assert!(node(&[R]) < node(&[R, F]));
        assert!(node(&[R, O]) < node(&[O]));
        assert!(node(&[O, F]) < node(&[O, O]));
    }

    #[test]
    fn test_lower_cost_wins() {
        let best = BestCandidate::new();
        assert!(best.offer(5.0, node(&[R]), 0.0, PrecedenceRelation::new));
        assert!(best.offer(4.0, node(&[R, R]), 0.1, PrecedenceRelation::new));
        assert!(!best.offer(4.5, node(&[F]), 0.2, PrecedenceRelation::new));
        assert_eq!(best.cost(), Some(4.0));

        let (winner, improvements, history) = best.into_parts();
        assert_eq!(winner.unwrap().key, node(&[R, R]));
        assert_eq!(improvements, 2);
        assert_eq!(history, vec![(0.0, 5.0), (0.1, 4.0)]);
    }

    #[test]
    fn test_tie_keeps_earliest_regardless_of_offer_order() {
        let forward = BestCandidate::new();
        forward.offer(3.0, node(&[F]), 0.0, PrecedenceRelation::new);
        forward.offer(3.0, node(&[R]), 0.0, PrecedenceRelation::new);

        let backward = BestCandidate::new();
        backward.offer(3.0, node(&[R]), 0.0, PrecedenceRelation::new);
        backward.offer(3.0, node(&[F]), 0.0, PrecedenceRelation::new);

        assert_eq!(forward.into_parts().0.unwrap().key, node(&[F]));
        assert_eq!(backward.into_parts().0.unwrap().key, node(&[F]));
    }

    #[test]
    fn test_baseline_wins_ties() {
        let best = BestCandidate::new();
        best.offer(2.0, CandidateKey::Baseline, 0.0, PrecedenceRelation::new);
        assert!(!best.offer(2.0, node(&[F, F]), 0.0, PrecedenceRelation::new));
    }
}
