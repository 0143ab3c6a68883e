//! Reachability over precedence relations.
//!
//! Computes transitive closures, detects cycles and enumerates the pairs of
//! activities whose relative order is still open. Rows of the reachability
//! matrix are stored as `u64` words, so appending a single edge costs
//! O(n^2 / 64).

use crate::models::PrecedenceRelation;

const WORD_BITS: usize = 64;

/// Transitive closure of a precedence relation over `n` activities.
///
/// `reaches(a, b)` is true iff there is a non-empty path `a -> ... -> b`.
/// A cycle shows up either as `reaches(a, a)` or as mutual reachability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Closure {
    n: usize,
    words: usize,
    rows: Vec<u64>,
}

impl Closure {
    /// Closure with no edges.
    pub fn empty(n: usize) -> Self {
        let words = n.div_ceil(WORD_BITS).max(1);
        Self {
            n,
            words,
            rows: vec![0; n * words],
        }
    }

    /// Floyd-Warshall style all-pairs reachability, O(n^3 / 64).
    ///
    /// Edges with an endpoint outside `0..n` are ignored; callers that care
    /// check [`PrecedenceRelation::edge_out_of_range`] first.
    pub fn from_relation(relation: &PrecedenceRelation, n: usize) -> Self {
        let mut closure = Self::empty(n);
        for &(a, b) in relation.edges() {
            if a < n && b < n {
                closure.set(a, b);
            }
        }

        for k in 0..n {
            for i in 0..n {
                if closure.reaches(i, k) {
                    closure.or_row_into(k, i);
                }
            }
        }
        closure
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn reaches(&self, a: usize, b: usize) -> bool {
        self.rows[a * self.words + b / WORD_BITS] & (1u64 << (b % WORD_BITS)) != 0
    }

    /// True if neither `a -> b` nor `b -> a` is implied.
    #[inline]
    pub fn is_unresolved(&self, a: usize, b: usize) -> bool {
        !self.reaches(a, b) && !self.reaches(b, a)
    }

    /// No self-reachability and no pair reachable in both directions.
    pub fn is_acyclic(&self) -> bool {
        for a in 0..self.n {
            if self.reaches(a, a) {
                return false;
            }
            for b in (a + 1)..self.n {
                if self.reaches(a, b) && self.reaches(b, a) {
                    return false;
                }
            }
        }
        true
    }

    /// Append edge `(a, b)` and update reachability incrementally.
    ///
    /// Everything that reaches `a` (and `a` itself) now reaches `b` and
    /// everything `b` reaches. Returns false, leaving the closure untouched,
    /// if the edge would close a cycle.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        if a == b || self.reaches(b, a) {
            return false;
        }
        if self.reaches(a, b) {
            return true;
        }

        let mut target = self.row(b).to_vec();
        target[b / WORD_BITS] |= 1u64 << (b % WORD_BITS);

        for x in 0..self.n {
            if x == a || self.reaches(x, a) {
                let start = x * self.words;
                for (dst, src) in self.rows[start..start + self.words].iter_mut().zip(&target) {
                    *dst |= *src;
                }
            }
        }
        true
    }

    /// Every pair reachable in `other` is reachable here.
    pub fn extends(&self, other: &Closure) -> bool {
        self.n == other.n
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(mine, theirs)| theirs & !mine == 0)
    }

    /// First pair reachable in `other` but not here.
    pub fn first_missing(&self, other: &Closure) -> Option<(usize, usize)> {
        (0..other.n)
            .flat_map(|a| (0..other.n).map(move |b| (a, b)))
            .find(|&(a, b)| {
                other.reaches(a, b) && (a >= self.n || b >= self.n || !self.reaches(a, b))
            })
    }

    /// Unordered pairs `(a, b)`, `a < b`, left open by this closure, in
    /// lexicographic order.
    pub fn unresolved_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for a in 0..self.n {
            for b in (a + 1)..self.n {
                if self.is_unresolved(a, b) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    fn set(&mut self, a: usize, b: usize) {
        self.rows[a * self.words + b / WORD_BITS] |= 1u64 << (b % WORD_BITS);
    }

    fn row(&self, a: usize) -> &[u64] {
        &self.rows[a * self.words..(a + 1) * self.words]
    }

    fn or_row_into(&mut self, src: usize, dst: usize) {
        if src == dst {
            // Row already contains itself; nothing new can be learned.
            return;
        }
        for w in 0..self.words {
            let bits = self.rows[src * self.words + w];
            self.rows[dst * self.words + w] |= bits;
        }
    }
}

/// All-pairs reachability of `relation` over `n` activities.
pub fn transitive_closure(relation: &PrecedenceRelation, n: usize) -> Closure {
    Closure::from_relation(relation, n)
}

/// True iff the closure of `relation` contains no cycle.
pub fn is_acyclic(relation: &PrecedenceRelation, n: usize) -> bool {
    Closure::from_relation(relation, n).is_acyclic()
}

/// Pairs `(a, b)`, `a < b`, ordered by neither direction of the closure.
pub fn unresolved_pairs(relation: &PrecedenceRelation, n: usize) -> Vec<(usize, usize)> {
    Closure::from_relation(relation, n).unresolved_pairs()
}
