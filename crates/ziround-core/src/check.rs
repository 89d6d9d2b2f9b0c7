//! From-scratch feasibility checks, independent of the incremental
//! bookkeeping in [`SolutionState`].

use crate::error::RoundingError;
use crate::numeric::fractionality;
use crate::problem::{Problem, RowSense};
use crate::singleton::SingletonIndex;
use crate::solution::ConstraintViolation;
use crate::state::SolutionState;

/// Every bound and row that `values` violates by more than `tol` (scaled by
/// the magnitude of the bound or right-hand side), worst first.
pub fn violations(problem: &Problem, values: &[f64], tol: f64) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    for (j, &v) in values.iter().enumerate().take(problem.ncols()) {
        let name = problem.var_name(j);
        let (l, u) = (problem.lower(j), problem.upper(j));
        if v < l - tol * l.abs().max(1.0) {
            violations.push(ConstraintViolation {
                constraint: name.to_string(),
                required: l,
                actual: v,
                violation_amount: l - v,
                description: format!("{name} is below its lower bound {l:.6} by {:.6}", l - v),
            });
        } else if v > u + tol * u.abs().max(1.0) {
            violations.push(ConstraintViolation {
                constraint: name.to_string(),
                required: u,
                actual: v,
                violation_amount: v - u,
                description: format!("{name} exceeds its upper bound {u:.6} by {:.6}", v - u),
            });
        }
    }

    for i in 0..problem.nrows() {
        let name = problem.row_name(i);
        let rhs = problem.rhs(i);
        let lhs = problem.activity(i, values);
        let limit = tol * rhs.abs().max(1.0);

        let violation = match problem.row_sense(i) {
            RowSense::Le if lhs > rhs + limit => Some((
                lhs - rhs,
                format!("{name} exceeds maximum of {rhs:.6} by {:.6}", lhs - rhs),
            )),
            RowSense::Ge if lhs < rhs - limit => Some((
                rhs - lhs,
                format!("{name} is below minimum of {rhs:.6} by {:.6}", rhs - lhs),
            )),
            RowSense::Eq if (lhs - rhs).abs() > limit => Some((
                (lhs - rhs).abs(),
                format!("{name} requires exactly {rhs:.6} but got {lhs:.6}"),
            )),
            _ => None,
        };

        if let Some((violation_amount, description)) = violation {
            violations.push(ConstraintViolation {
                constraint: name.to_string(),
                required: rhs,
                actual: lhs,
                violation_amount,
                description,
            });
        }
    }

    violations.sort_by(|a, b| {
        b.violation_amount
            .partial_cmp(&a.violation_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    violations
}

/// Sum of fractionalities of the integral variables at `values`.
pub fn total_fractionality(problem: &Problem, values: &[f64]) -> f64 {
    (0..problem.ncols())
        .filter(|&j| problem.is_integral(j))
        .map(|j| fractionality(values[j]))
        .sum()
}

/// Integral variables farther than `tol` from an integer.
pub fn count_unrounded(problem: &Problem, values: &[f64], tol: f64) -> usize {
    (0..problem.ncols())
        .filter(|&j| problem.is_integral(j) && fractionality(values[j]) > tol)
        .count()
}

/// Recomputes every tracked quantity of `state` and fails on the first
/// disagreement or violated bound/row.
pub fn audit(
    problem: &Problem,
    singletons: Option<&SingletonIndex>,
    state: &SolutionState,
    tol: f64,
) -> Result<(), RoundingError> {
    let x = state.values();
    if let Some(first) = violations(problem, x, tol).into_iter().next() {
        return Err(RoundingError::AuditViolation(first.description));
    }

    let agree = |tracked: f64, actual: f64| (tracked - actual).abs() <= tol * (1.0 + actual.abs());
    let mismatch = |quantity: String, tracked: f64, actual: f64| RoundingError::AuditMismatch {
        quantity,
        tracked,
        actual,
    };

    let objective = problem.objective_value(x);
    if !agree(state.objective_value(), objective) {
        return Err(mismatch("objective".into(), state.objective_value(), objective));
    }

    let frac = total_fractionality(problem, x);
    if !agree(state.fractionality(), frac) {
        return Err(mismatch("fractionality".into(), state.fractionality(), frac));
    }

    let unrounded = count_unrounded(problem, x, tol);
    if state.num_to_round() != unrounded {
        return Err(mismatch(
            "unrounded count".into(),
            state.num_to_round() as f64,
            unrounded as f64,
        ));
    }

    for i in 0..problem.nrows() {
        let slack = problem.rhs(i) - problem.activity(i, x);
        if !agree(state.slack(i), slack) {
            return Err(mismatch(
                format!("slack of {}", problem.row_name(i)),
                state.slack(i),
                slack,
            ));
        }
        if let Some(index) = singletons.filter(|index| index.has_singletons(i)) {
            let value = index.value(i, x);
            if !agree(state.singleton_value(i), value) {
                return Err(mismatch(
                    format!("singleton aggregate of {}", problem.row_name(i)),
                    state.singleton_value(i),
                    value,
                ));
            }
        }
    }
    Ok(())
}
