//! Post-hoc certification of a refinement and its claimed cost.

use thiserror::Error;

use crate::models::{Instance, PrecedenceRelation};
use crate::order::Closure;
use crate::risk::expected_makespan;
use crate::schedule::{earliest_start_schedule, ScheduleError};

/// Absolute tolerance for every numeric comparison.
pub const TOLERANCE: f64 = 1e-6;

/// Expected makespan of `relation` on `instance`.
pub fn evaluate(instance: &Instance, relation: &PrecedenceRelation) -> Result<f64, ScheduleError> {
    let schedule = earliest_start_schedule(instance.n(), instance.durations(), relation)?;
    Ok(expected_makespan(
        &schedule,
        instance.durations(),
        instance.ko_probabilities(),
    ))
}

/// Why a relation failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    #[error("Precedence ({0}, {1}) references an activity outside 0..{2}")]
    EdgeOutOfRange(usize, usize, usize),

    #[error("Relation drops initial order {0} -> {1}")]
    MissingInitialOrder(usize, usize),

    #[error("Relation is cyclic")]
    Cyclic,

    #[error("Claimed expected makespan {claimed} but recomputed {actual}")]
    NumericMismatch { claimed: f64, actual: f64 },
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub valid: bool,
    pub failure: Option<ValidationFailure>,
}

impl Validation {
    fn ok() -> Self {
        Self {
            valid: true,
            failure: None,
        }
    }

    fn failed(failure: ValidationFailure) -> Self {
        Self {
            valid: false,
            failure: Some(failure),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Display text of the failure, if any.
    pub fn reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// Check that `relation` extends the initial relation, is acyclic and
/// evaluates to `claimed` within [`TOLERANCE`].
///
/// Checks run in that order (after a range check) and the first failure is
/// reported.
pub fn validate(instance: &Instance, relation: &PrecedenceRelation, claimed: f64) -> Validation {
    let n = instance.n();
    if let Some((a, b)) = relation.edge_out_of_range(n) {
        return Validation::failed(ValidationFailure::EdgeOutOfRange(a, b, n));
    }

    let closure = Closure::from_relation(relation, n);
    let initial = Closure::from_relation(instance.initial_relation(), n);
    if let Some((a, b)) = closure.first_missing(&initial) {
        return Validation::failed(ValidationFailure::MissingInitialOrder(a, b));
    }
    if !closure.is_acyclic() {
        return Validation::failed(ValidationFailure::Cyclic);
    }

    let actual = match evaluate(instance, relation) {
        Ok(actual) => actual,
        Err(_) => return Validation::failed(ValidationFailure::Cyclic),
    };
    if (actual - claimed).abs() <= TOLERANCE {
        Validation::ok()
    } else {
        Validation::failed(ValidationFailure::NumericMismatch { claimed, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(edges: &[(usize, usize)]) -> PrecedenceRelation {
        PrecedenceRelation::from_edges(edges.iter().copied())
    }

    fn chain_instance() -> Instance {
        Instance::new(vec![2.0, 2.0, 2.0], vec![0.5, 0.5, 0.5], rel(&[(0, 1)])).unwrap()
    }

    #[test]
    fn test_evaluate_concrete() {
        let instance = Instance::new(vec![3.0, 5.0], vec![0.0, 0.0], rel(&[])).unwrap();
        assert_eq!(evaluate(&instance, instance.initial_relation()).unwrap(), 5.0);

        let chain = chain_instance();
        let e = evaluate(&chain, &rel(&[(0, 1), (1, 2)])).unwrap();
        assert!((e - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_rejects_cycle() {
        let instance = chain_instance();
        let err = evaluate(&instance, &rel(&[(0, 1), (1, 0)])).unwrap_err();
        assert!(matches!(err, ScheduleError::CycleDetected { .. }));
    }

    #[test]
    fn test_baseline_validates_against_itself() {
        let instance = chain_instance();
        let cost = evaluate(&instance, instance.initial_relation()).unwrap();
        let validation = validate(&instance, instance.initial_relation(), cost);
        assert!(validation.is_valid());
        assert_eq!(validation.failure, None);
        assert_eq!(validation.reason(), None);
    }

    #[test]
    fn test_tolerance_boundary() {
        let instance = chain_instance();
        let relation = rel(&[(0, 1), (1, 2)]);
        assert!(validate(&instance, &relation, 3.5 + 0.5e-6).is_valid());

        let validation = validate(&instance, &relation, 3.5 + 1e-5);
        assert!(!validation.is_valid());
        assert!(matches!(
            validation.failure,
            Some(ValidationFailure::NumericMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_initial_order() {
        let instance = chain_instance();
        let validation = validate(&instance, &rel(&[(1, 2)]), 0.0);
        assert_eq!(
            validation.failure,
            Some(ValidationFailure::MissingInitialOrder(0, 1))
        );
    }

    #[test]
    fn test_transitively_implied_initial_order_is_kept() {
        // 0 -> 2 -> 1 still orders 0 before 1
        let instance = chain_instance();
        let relation = rel(&[(0, 2), (2, 1)]);
        let cost = evaluate(&instance, &relation).unwrap();
        assert!(validate(&instance, &relation, cost).is_valid());
    }

    #[test]
    fn test_cyclic_relation() {
        let instance = chain_instance();
        let validation = validate(&instance, &rel(&[(0, 1), (1, 2), (2, 0)]), 3.5);
        assert_eq!(validation.failure, Some(ValidationFailure::Cyclic));
        assert_eq!(validation.reason().as_deref(), Some("Relation is cyclic"));
    }

    #[test]
    fn test_out_of_range_edge() {
        let instance = chain_instance();
        let validation = validate(&instance, &rel(&[(0, 1), (1, 7)]), 0.0);
        assert_eq!(
            validation.failure,
            Some(ValidationFailure::EdgeOutOfRange(1, 7, 3))
        );
    }

    #[test]
    fn test_nan_claim_is_rejected() {
        let instance = chain_instance();
        let validation = validate(&instance, instance.initial_relation(), f64::NAN);
        assert!(!validation.is_valid());
    }
}
