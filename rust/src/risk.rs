//! Expected makespan under knockout risk.
//!
//! Any activity may knock out the whole process. When activity `a` knocks
//! out, everything overlapping `a` is aborted too, so the process stops at
//! the latest finish among `a` and the activities overlapping it (`a`'s abort
//! time). Activities are grouped into buckets by identical abort time and the
//! expectation is taken over "first bucket with a knockout":
//!
//! ```text
//! Q_j = prod_{a in bucket j} (1 - p_a)
//! P_0 = 1,  P_j = P_{j-1} * Q_{j-1}
//! E   = sum_j t_j * P_j * (1 - Q_j) + T * P_k
//! ```
//!
//! Overlap is tested pairwise, not as connected components: two activities
//! land in the same bucket only because their abort times happen to match.

use rustc_hash::FxHashMap;

use crate::schedule::Schedule;

/// Activities sharing one abort time.
#[derive(Clone, Debug, PartialEq)]
pub struct KnockoutBucket {
    /// Time at which a knockout in this bucket stops the process.
    pub abort_time: f64,
    /// Activity ids, ascending.
    pub members: Vec<usize>,
    /// Probability that no member knocks out.
    pub survival: f64,
}

/// Abort time per activity: its own finish or the latest finish of any
/// activity whose half-open interval overlaps it.
///
/// # Panics
/// If `durations` has fewer entries than `schedule` has activities.
pub fn abort_times(schedule: &Schedule, durations: &[f64]) -> Vec<f64> {
    let starts = schedule.starts();
    let finishes = schedule.finishes(durations);

    (0..finishes.len())
        .map(|a| {
            let mut abort = finishes[a];
            for b in 0..finishes.len() {
                if a == b {
                    continue;
                }
                let disjoint = finishes[a] <= starts[b] || finishes[b] <= starts[a];
                if !disjoint {
                    abort = abort.max(finishes[b]);
                }
            }
            abort
        })
        .collect()
}

/// Group activities by abort time, ascending.
///
/// # Panics
/// If `durations` or `probabilities` has fewer entries than `schedule` has
/// activities.
pub fn knockout_buckets(
    schedule: &Schedule,
    durations: &[f64],
    probabilities: &[f64],
) -> Vec<KnockoutBucket> {
    let aborts = abort_times(schedule, durations);

    // Exact equality on abort times; `+ 0.0` folds -0.0 into 0.0.
    let mut by_time: FxHashMap<u64, KnockoutBucket> = FxHashMap::default();
    for (activity, &abort) in aborts.iter().enumerate() {
        let bucket = by_time
            .entry((abort + 0.0).to_bits())
            .or_insert_with(|| KnockoutBucket {
                abort_time: abort,
                members: Vec::new(),
                survival: 1.0,
            });
        bucket.members.push(activity);
        bucket.survival *= 1.0 - probabilities[activity];
    }

    let mut buckets: Vec<KnockoutBucket> = by_time.into_values().collect();
    buckets.sort_by(|a, b| a.abort_time.total_cmp(&b.abort_time));
    buckets
}

/// Expected stopping time of `schedule` given per-activity knockout
/// probabilities.
///
/// Equals the plain makespan exactly when every probability is 0. An empty
/// schedule evaluates to 0.
///
/// # Panics
/// If `durations` or `probabilities` has fewer entries than `schedule` has
/// activities.
pub fn expected_makespan(schedule: &Schedule, durations: &[f64], probabilities: &[f64]) -> f64 {
    let makespan = schedule.makespan(durations);
    let buckets = knockout_buckets(schedule, durations, probabilities);

    let mut expected = 0.0;
    let mut reach = 1.0; // P_j
    for bucket in &buckets {
        expected += bucket.abort_time * reach * (1.0 - bucket.survival);
        reach *= bucket.survival;
    }
    expected + makespan * reach
}
