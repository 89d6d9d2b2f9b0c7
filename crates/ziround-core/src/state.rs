use crate::error::RoundingError;
use crate::numeric::fractionality;
use crate::problem::{Problem, RowSense};
use crate::singleton::SingletonIndex;

/// The mutable side of a rounding run.
///
/// `slack[i]` is `rhs[i]` minus the full activity of row `i`, singleton terms
/// included; `singleton_value[i]` tracks the singleton part separately so the
/// room left in the singleton reservoir is known without a row scan.
#[derive(Debug, Clone)]
pub struct SolutionState {
    pub(crate) x: Vec<f64>,
    pub(crate) slack: Vec<f64>,
    pub(crate) ss_val: Vec<f64>,
    pub(crate) objval: f64,
    pub(crate) fractionality: f64,
    pub(crate) num_to_round: usize,
}

impl SolutionState {
    /// Builds the state for `start`, which must respect bounds and rows within
    /// `tol` (scaled by the magnitude of the bound or right-hand side).
    pub fn new(
        problem: &Problem,
        singletons: Option<&SingletonIndex>,
        start: &[f64],
        tol: f64,
    ) -> Result<Self, RoundingError> {
        if start.len() != problem.ncols() {
            return Err(RoundingError::StartLength {
                expected: problem.ncols(),
                actual: start.len(),
            });
        }

        for (j, &v) in start.iter().enumerate() {
            let (l, u) = (problem.lower(j), problem.upper(j));
            if !v.is_finite() || v < l - tol * l.abs().max(1.0) || v > u + tol * u.abs().max(1.0) {
                return Err(RoundingError::StartOutOfBounds {
                    var: problem.var_name(j).to_string(),
                    value: v,
                    lower: l,
                    upper: u,
                });
            }
        }

        let mut slack = Vec::with_capacity(problem.nrows());
        for i in 0..problem.nrows() {
            let rhs = problem.rhs(i);
            let activity = problem.activity(i, start);
            let s = rhs - activity;
            let limit = tol * rhs.abs().max(1.0);
            let feasible = match problem.row_sense(i) {
                RowSense::Le => s >= -limit,
                RowSense::Ge => s <= limit,
                RowSense::Eq => s.abs() <= limit,
            };
            if !feasible {
                return Err(RoundingError::StartInfeasible {
                    row: problem.row_name(i).to_string(),
                    activity,
                    rhs,
                });
            }
            slack.push(s);
        }

        let ss_val = match singletons {
            Some(index) => (0..problem.nrows()).map(|i| index.value(i, start)).collect(),
            None => vec![0.0; problem.nrows()],
        };

        let mut frac_sum = 0.0;
        let mut num_to_round = 0;
        for (j, &v) in start.iter().enumerate() {
            if problem.is_integral(j) {
                let f = fractionality(v);
                frac_sum += f;
                if f > tol {
                    num_to_round += 1;
                }
            }
        }

        let state = Self {
            x: start.to_vec(),
            slack,
            ss_val,
            objval: problem.objective_value(start),
            fractionality: frac_sum,
            num_to_round,
        };
        tracing::debug!(
            objval = state.objval,
            fractionality = state.fractionality,
            num_to_round = state.num_to_round,
            "initialized rounding state"
        );
        Ok(state)
    }

    pub fn values(&self) -> &[f64] {
        &self.x
    }

    pub fn into_values(self) -> Vec<f64> {
        self.x
    }

    pub fn slack(&self, i: usize) -> f64 {
        self.slack[i]
    }

    pub fn singleton_value(&self, i: usize) -> f64 {
        self.ss_val[i]
    }

    pub fn objective_value(&self) -> f64 {
        self.objval
    }

    pub fn fractionality(&self) -> f64 {
        self.fractionality
    }

    /// Integral variables whose value is not yet within tolerance of an integer.
    pub fn num_to_round(&self) -> usize {
        self.num_to_round
    }

    /// Book-keeps a shift of one integral variable whose fractionality went
    /// from `before` to `after`.
    pub(crate) fn record_rounding(&mut self, before: f64, after: f64, tol: f64) {
        self.fractionality += after - before;
        if self.fractionality < 0.0 {
            self.fractionality = 0.0;
        }
        match (before > tol, after > tol) {
            (true, false) => self.num_to_round -= 1,
            (false, true) => self.num_to_round += 1,
            _ => {}
        }
    }
}
