//! Rust core for knockout-plan refinement.
//!
//! Given activities with durations and knockout probabilities plus a partial
//! precedence order, finds the refinement of that order minimizing expected
//! makespan, and certifies returned refinements.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

pub mod config;
pub mod dominance;
pub mod logging;
pub mod models;
pub mod order;
pub mod risk;
pub mod schedule;
pub mod search;
pub mod validation;

pub use config::SearchConfig;
pub use models::{Activity, Instance, InstanceError, PrecedenceRelation};
pub use order::{is_acyclic, transitive_closure, unresolved_pairs, Closure};
pub use risk::{expected_makespan, knockout_buckets, KnockoutBucket};
pub use schedule::{earliest_start_schedule, Schedule, ScheduleError};
pub use search::{solve, SearchError, SearchResult, SearchStats, SearchStatus};
pub use validation::{evaluate, validate, Validation, ValidationFailure, TOLERANCE};

fn relation_for(
    instance: &Instance,
    precedence: Vec<(usize, usize)>,
) -> PyResult<PrecedenceRelation> {
    let relation = PrecedenceRelation::from_edges(precedence);
    match relation.edge_out_of_range(instance.n()) {
        Some((a, b)) => Err(PyValueError::new_err(
            ScheduleError::EdgeOutOfRange(a, b, instance.n()).to_string(),
        )),
        None => Ok(relation),
    }
}

/// Search for the refinement of the instance's precedence order with the
/// lowest expected makespan.
///
/// # Arguments
/// * `instance` - Activities and initial precedence relation
/// * `config` - Search configuration (defaults: no time limit, complete
///   orientations only, one thread)
///
/// # Returns
/// * SearchResult with the best relation found and its expected makespan
///
/// # Raises
/// * ValueError if the initial relation cannot be scheduled
#[pyfunction]
#[pyo3(name = "solve", signature = (instance, config=None))]
fn py_solve(
    py: Python<'_>,
    instance: &Instance,
    config: Option<SearchConfig>,
) -> PyResult<SearchResult> {
    let config = config.unwrap_or_default();
    py.allow_threads(|| solve(instance, &config))
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Expected makespan of `precedence` on the instance's activities.
///
/// # Raises
/// * ValueError if the relation is cyclic or references unknown activities
#[pyfunction]
#[pyo3(name = "evaluate")]
fn py_evaluate(instance: &Instance, precedence: Vec<(usize, usize)>) -> PyResult<f64> {
    let relation = relation_for(instance, precedence)?;
    evaluate(instance, &relation).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Certify a refinement and its claimed expected makespan.
///
/// # Returns
/// * `(valid, reason)`; `reason` is None when valid. Never raises.
#[pyfunction]
#[pyo3(name = "validate")]
fn py_validate(
    instance: &Instance,
    precedence: Vec<(usize, usize)>,
    claimed_makespan: f64,
) -> (bool, Option<String>) {
    let validation = validate(
        instance,
        &PrecedenceRelation::from_edges(precedence),
        claimed_makespan,
    );
    (validation.is_valid(), validation.reason())
}

/// Earliest start time of every activity under `precedence`.
#[pyfunction]
#[pyo3(name = "earliest_start_schedule")]
fn py_earliest_start_schedule(
    instance: &Instance,
    precedence: Vec<(usize, usize)>,
) -> PyResult<Vec<f64>> {
    let relation = relation_for(instance, precedence)?;
    earliest_start_schedule(instance.n(), instance.durations(), &relation)
        .map(|schedule| schedule.starts().to_vec())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Pairs `(a, b)`, `a < b`, left unordered by `precedence` (default: the
/// instance's initial relation).
#[pyfunction]
#[pyo3(name = "unresolved_pairs", signature = (instance, precedence=None))]
fn py_unresolved_pairs(
    instance: &Instance,
    precedence: Option<Vec<(usize, usize)>>,
) -> PyResult<Vec<(usize, usize)>> {
    let relation = match precedence {
        Some(edges) => relation_for(instance, edges)?,
        None => instance.initial_relation().clone(),
    };
    Ok(unresolved_pairs(&relation, instance.n()))
}

/// Dominance edges `(i, j)`: `i` is no longer and no less risky than `j`.
#[pyfunction]
#[pyo3(name = "dominance_edges")]
fn py_dominance_edges(instance: &Instance) -> Vec<(usize, usize)> {
    dominance::dominance_edges(instance)
}

/// Pairs whose knockout rate per unit time differs by more than `threshold`.
#[pyfunction]
#[pyo3(name = "risk_ratio_suggestions", signature = (instance, threshold=2.0))]
fn py_risk_ratio_suggestions(instance: &Instance, threshold: f64) -> Vec<(usize, usize)> {
    dominance::risk_ratio_suggestions(instance, threshold)
}

/// The koref.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Instance>()?;
    m.add_class::<SearchResult>()?;
    m.add_class::<SearchStats>()?;

    // Config types
    m.add_class::<SearchConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_solve, m)?)?;
    m.add_function(wrap_pyfunction!(py_evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(py_validate, m)?)?;

    // Analysis helpers
    m.add_function(wrap_pyfunction!(py_earliest_start_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_unresolved_pairs, m)?)?;
    m.add_function(wrap_pyfunction!(py_dominance_edges, m)?)?;
    m.add_function(wrap_pyfunction!(py_risk_ratio_suggestions, m)?)?;

    Ok(())
}
