//! Forced-order analysis from activity dominance.
//!
//! Activity `i` dominates `j` when it is no longer (`d_i <= d_j`) and no less
//! risky (`p_i >= p_j`), with at least one strict inequality. Such an `i`
//! precedes `j` in every optimal refinement, so `i < j` can be folded into
//! the relation before search to shrink the choice tree.

use crate::models::{Activity, Instance, PrecedenceRelation};
use crate::order::Closure;

fn dominates(i: &Activity, j: &Activity) -> bool {
    let weakly = i.duration <= j.duration && i.ko_probability >= j.ko_probability;
    let strictly = i.duration < j.duration || i.ko_probability > j.ko_probability;
    weakly && strictly
}

/// All dominance edges `(i, j)`, in lexicographic order.
pub fn dominance_edges(instance: &Instance) -> Vec<(usize, usize)> {
    let activities: Vec<Activity> = instance.activities().collect();
    let mut forced = Vec::new();
    for i in &activities {
        for j in &activities {
            if i.id != j.id && dominates(i, j) {
                forced.push((i.id, j.id));
            }
        }
    }
    forced
}

/// Pairs `(i, j)` whose knockout-rate-per-time `p/d` exceeds the other's by
/// more than `threshold` times.
///
/// This is an analysis heuristic only. The search never applies it.
pub fn risk_ratio_suggestions(instance: &Instance, threshold: f64) -> Vec<(usize, usize)> {
    let ratios: Vec<(usize, f64)> = instance
        .activities()
        .map(|a| (a.id, a.ko_probability / a.duration))
        .collect();

    let mut suggested = Vec::new();
    for &(i, ri) in &ratios {
        for &(j, rj) in &ratios {
            if i != j && ri > 0.0 && rj > 0.0 && ri / rj > threshold {
                suggested.push((i, j));
            }
        }
    }
    suggested
}

/// Fold dominance edges into the initial relation.
///
/// Edges are taken in lexicographic order and only for pairs the working
/// closure still leaves open, so the result is acyclic and extends the
/// initial relation. Returns the working relation, its closure and the
/// number of edges folded in.
pub fn fold_dominance(instance: &Instance) -> (PrecedenceRelation, Closure, usize) {
    let n = instance.n();
    let mut relation = instance.initial_relation().clone();
    let mut closure = Closure::from_relation(&relation, n);
    let mut folded = 0;

    for (i, j) in dominance_edges(instance) {
        if closure.is_unresolved(i, j) && closure.add_edge(i, j) {
            relation.insert(i, j);
            folded += 1;
        }
    }
    (relation, closure, folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(durations: &[f64], probs: &[f64]) -> Instance {
        Instance::new(durations.to_vec(), probs.to_vec(), PrecedenceRelation::new()).unwrap()
    }

    #[test]
    fn test_strict_dominance() {
        // 0 shorter and riskier than 1; 2 identical to 1
        let edges = dominance_edges(&free(&[1.0, 2.0, 2.0], &[0.5, 0.2, 0.2]));
        assert_eq!(edges, vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn test_no_dominance_when_tradeoff() {
        // shorter but safer: neither dominates
        let edges = dominance_edges(&free(&[1.0, 2.0], &[0.1, 0.5]));
        assert!(edges.is_empty());
    }

    #[test]
    fn test_equal_duration_higher_risk_dominates() {
        let edges = dominance_edges(&free(&[3.0, 3.0], &[0.1, 0.4]));
        assert_eq!(edges, vec![(1, 0)]);
    }

    #[test]
    fn test_risk_ratio_suggestions() {
        // ratios: 0.5, 0.1, 0.0
        let suggested = risk_ratio_suggestions(&free(&[1.0, 2.0, 1.0], &[0.5, 0.2, 0.0]), 2.0);
        assert_eq!(suggested, vec![(0, 1)]);
        assert!(risk_ratio_suggestions(&free(&[1.0, 2.0], &[0.5, 0.2]), 10.0).is_empty());
    }

    #[test]
    fn test_fold_skips_resolved_pairs() {
        // initial forces 1 before 0 even though 0 dominates 1
        let instance = Instance::new(
            vec![1.0, 2.0, 3.0],
            vec![0.5, 0.2, 0.1],
            PrecedenceRelation::from_edges([(1, 0)]),
        )
        .unwrap();

        let (relation, closure, folded) = fold_dominance(&instance);
        assert!(closure.is_acyclic());
        assert!(relation.contains(1, 0));
        assert!(!relation.contains(0, 1));
        // (0,2) is folded; (1,2) then follows transitively
        assert_eq!(folded, 1);
        assert!(relation.contains(0, 2));
        assert!(closure.reaches(1, 2));
        assert!(closure.unresolved_pairs().is_empty());
    }
}
