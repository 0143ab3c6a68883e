//! Core data types for KO-plan refinement instances.

use pyo3::prelude::*;
use thiserror::Error;

use crate::order::Closure;

/// Reasons an instance is rejected before any search starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    #[error("Instance has no activities")]
    Empty,
    #[error("Got {durations} durations but {probabilities} knockout probabilities")]
    LengthMismatch {
        durations: usize,
        probabilities: usize,
    },
    #[error("Activity {activity} has invalid duration {value} (must be positive and finite)")]
    InvalidDuration { activity: usize, value: f64 },
    #[error("Activity {activity} has knockout probability {value} outside [0, 1]")]
    InvalidProbability { activity: usize, value: f64 },
    #[error("Precedence ({0}, {1}) references an activity outside 0..{2}")]
    EdgeOutOfRange(usize, usize, usize),
    #[error("Precedence ({0}, {0}) is a self-loop")]
    SelfLoop(usize),
    #[error("Initial precedence relation is cyclic")]
    CyclicRelation,
}

/// A single activity: fixed duration and knockout probability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Activity {
    pub id: usize,
    pub duration: f64,
    pub ko_probability: f64,
}

/// Directed precedence edges `(a, b)`: `a` finishes before `b` starts.
///
/// Kept sorted and deduplicated so iteration order is deterministic. The
/// relation is not transitively closed; use [`Closure`] for reachability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PrecedenceRelation {
    edges: Vec<(usize, usize)>,
}

impl PrecedenceRelation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut edges: Vec<(usize, usize)> = edges.into_iter().collect();
        edges.sort_unstable();
        edges.dedup();
        Self { edges }
    }

    /// Insert an edge. Returns false if it was already present.
    pub fn insert(&mut self, a: usize, b: usize) -> bool {
        match self.edges.binary_search(&(a, b)) {
            Ok(_) => false,
            Err(pos) => {
                self.edges.insert(pos, (a, b));
                true
            }
        }
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.edges.binary_search(&(a, b)).is_ok()
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Copy of this relation with extra edges appended.
    pub fn extended<I>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        Self::from_edges(self.edges.iter().copied().chain(extra))
    }

    /// First edge with an endpoint outside `0..n`, if any.
    pub fn edge_out_of_range(&self, n: usize) -> Option<(usize, usize)> {
        self.edges.iter().copied().find(|&(a, b)| a >= n || b >= n)
    }
}

impl FromIterator<(usize, usize)> for PrecedenceRelation {
    fn from_iter<T: IntoIterator<Item = (usize, usize)>>(iter: T) -> Self {
        Self::from_edges(iter)
    }
}

/// A validated refinement instance.
///
/// Activities and the initial relation are fixed at construction and never
/// mutated afterwards.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Instance {
    durations: Vec<f64>,
    ko_probabilities: Vec<f64>,
    initial_relation: PrecedenceRelation,
}

impl Instance {
    /// Validate inputs and build an instance.
    ///
    /// Rejects empty instances, mismatched lengths, non-positive durations,
    /// probabilities outside `[0, 1]`, out-of-range or self-loop edges, and
    /// cyclic initial relations.
    pub fn new(
        durations: Vec<f64>,
        ko_probabilities: Vec<f64>,
        initial_relation: PrecedenceRelation,
    ) -> Result<Self, InstanceError> {
        let n = durations.len();
        if n == 0 {
            return Err(InstanceError::Empty);
        }
        if ko_probabilities.len() != n {
            return Err(InstanceError::LengthMismatch {
                durations: n,
                probabilities: ko_probabilities.len(),
            });
        }
        for (activity, &value) in durations.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(InstanceError::InvalidDuration { activity, value });
            }
        }
        for (activity, &value) in ko_probabilities.iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(InstanceError::InvalidProbability { activity, value });
            }
        }
        if let Some((a, b)) = initial_relation.edge_out_of_range(n) {
            return Err(InstanceError::EdgeOutOfRange(a, b, n));
        }
        if let Some(&(a, _)) = initial_relation.edges().iter().find(|(a, b)| a == b) {
            return Err(InstanceError::SelfLoop(a));
        }
        if !Closure::from_relation(&initial_relation, n).is_acyclic() {
            return Err(InstanceError::CyclicRelation);
        }

        Ok(Self {
            durations,
            ko_probabilities,
            initial_relation,
        })
    }

    /// Number of activities.
    pub fn n(&self) -> usize {
        self.durations.len()
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn ko_probabilities(&self) -> &[f64] {
        &self.ko_probabilities
    }

    pub fn initial_relation(&self) -> &PrecedenceRelation {
        &self.initial_relation
    }

    pub fn activities(&self) -> impl Iterator<Item = Activity> + '_ {
        self.durations
            .iter()
            .zip(&self.ko_probabilities)
            .enumerate()
            .map(|(id, (&duration, &ko_probability))| Activity {
                id,
                duration,
                ko_probability,
            })
    }
}

#[pymethods]
impl Instance {
    #[new]
    #[pyo3(signature = (durations, ko_probabilities, precedence=Vec::new()))]
    fn py_new(
        durations: Vec<f64>,
        ko_probabilities: Vec<f64>,
        precedence: Vec<(usize, usize)>,
    ) -> PyResult<Self> {
        Self::new(
            durations,
            ko_probabilities,
            PrecedenceRelation::from_edges(precedence),
        )
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[getter(n)]
    fn py_n(&self) -> usize {
        self.n()
    }

    #[getter(durations)]
    fn py_durations(&self) -> Vec<f64> {
        self.durations.clone()
    }

    #[getter(ko_probabilities)]
    fn py_ko_probabilities(&self) -> Vec<f64> {
        self.ko_probabilities.clone()
    }

    #[getter(precedence)]
    fn py_precedence(&self) -> Vec<(usize, usize)> {
        self.initial_relation.edges().to_vec()
    }

    fn __repr__(&self) -> String {
        format!(
            "Instance(n={}, precedence={})",
            self.n(),
            self.initial_relation.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_dedup_and_order() {
        let rel = PrecedenceRelation::from_edges([(2, 1), (0, 1), (2, 1)]);
        assert_eq!(rel.edges(), &[(0, 1), (2, 1)]);

        let mut rel = rel;
        assert!(rel.insert(1, 3));
        assert!(!rel.insert(0, 1));
        assert!(rel.contains(1, 3));
        assert_eq!(rel.len(), 3);
    }

    #[test]
    fn test_valid_instance() {
        let instance = Instance::new(
            vec![1.0, 2.0],
            vec![0.1, 0.0],
            PrecedenceRelation::from_edges([(0, 1)]),
        )
        .unwrap();
        assert_eq!(instance.n(), 2);
        let activities: Vec<Activity> = instance.activities().collect();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[1].id, 1);
        assert!((activities[1].duration - 2.0).abs() < 1e-9);
        assert!((activities[1].ko_probability - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_empty() {
        let err = Instance::new(vec![], vec![], PrecedenceRelation::new()).unwrap_err();
        assert_eq!(err, InstanceError::Empty);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Instance::new(vec![1.0, 0.0], vec![0.0, 0.0], PrecedenceRelation::new())
            .unwrap_err();
        assert!(matches!(err, InstanceError::InvalidDuration { activity: 1, .. }));

        let err = Instance::new(vec![1.0], vec![1.5], PrecedenceRelation::new()).unwrap_err();
        assert!(matches!(err, InstanceError::InvalidProbability { activity: 0, .. }));

        let err = Instance::new(vec![1.0], vec![0.1, 0.2], PrecedenceRelation::new())
            .unwrap_err();
        assert!(matches!(err, InstanceError::LengthMismatch { .. }));
    }

    #[test]
    fn test_rejects_bad_edges() {
        let err = Instance::new(
            vec![1.0, 1.0],
            vec![0.0, 0.0],
            PrecedenceRelation::from_edges([(0, 2)]),
        )
        .unwrap_err();
        assert_eq!(err, InstanceError::EdgeOutOfRange(0, 2, 2));

        let err = Instance::new(
            vec![1.0, 1.0],
            vec![0.0, 0.0],
            PrecedenceRelation::from_edges([(1, 1)]),
        )
        .unwrap_err();
        assert_eq!(err, InstanceError::SelfLoop(1));
    }

    #[test]
    fn test_rejects_cyclic_initial_relation() {
        let err = Instance::new(
            vec![1.0, 1.0, 1.0],
            vec![0.0, 0.0, 0.0],
            PrecedenceRelation::from_edges([(0, 1), (1, 2), (2, 0)]),
        )
        .unwrap_err();
        assert_eq!(err, InstanceError::CyclicRelation);
    }
}
