use crate::error::RoundingError;
use crate::numeric::snap;
use crate::problem::{Problem, RowSense};
use crate::singleton::SingletonIndex;
use crate::state::SolutionState;

/// What a row does with an activity change: the slack it keeps and the
/// amount pushed into its singleton reservoir.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Routing {
    slack: f64,
    to_singletons: f64,
}

/// Applies shifts to a [`SolutionState`], keeping row slacks, singleton
/// aggregates and the objective value in step with `x`.
#[derive(Debug, Clone, Copy)]
pub struct SlackUpdater<'a> {
    problem: &'a Problem,
    singletons: Option<&'a SingletonIndex>,
    tolerance: f64,
}

impl<'a> SlackUpdater<'a> {
    pub fn new(problem: &'a Problem, singletons: Option<&'a SingletonIndex>, tolerance: f64) -> Self {
        Self {
            problem,
            singletons,
            tolerance,
        }
    }

    fn covering(&self, i: usize) -> Option<&'a SingletonIndex> {
        self.singletons.filter(|index| index.has_singletons(i))
    }

    fn row_tolerance(&self, i: usize) -> f64 {
        self.tolerance * self.problem.rhs(i).abs().max(1.0)
    }

    fn route(&self, state: &SolutionState, i: usize, raw: f64) -> Result<Routing, RoundingError> {
        let new = state.slack[i] - raw;
        let tol = self.row_tolerance(i);
        let covered = self.covering(i).is_some();
        let spill = Routing {
            slack: 0.0,
            to_singletons: new,
        };
        match self.problem.row_sense(i) {
            RowSense::Le if covered && new < -tol => Ok(spill),
            RowSense::Ge if covered && new > tol => Ok(spill),
            RowSense::Eq if covered => Ok(spill),
            RowSense::Eq if raw.abs() > tol => Err(RoundingError::UnabsorbedEquality {
                row: self.problem.row_name(i).to_string(),
                amount: raw,
            }),
            _ => Ok(Routing {
                slack: new,
                to_singletons: 0.0,
            }),
        }
    }

    /// Greedy assignment of `delta` (a change of `sum coef * x` over row `i`'s
    /// singletons) in ascending column order. Returns `(column, value step)`.
    fn plan_cover(&self, x: &[f64], i: usize, delta: f64) -> Result<Vec<(usize, f64)>, RoundingError> {
        let Some(index) = self.covering(i) else {
            return Err(RoundingError::SingletonResidual {
                row: self.problem.row_name(i).to_string(),
                residual: delta,
            });
        };

        let tol = self.tolerance * delta.abs().max(1.0);
        let mut remaining = delta;
        let mut steps = Vec::new();
        for entry in index.row(i) {
            if remaining.abs() <= tol {
                break;
            }
            let v = x[entry.col];
            let raises_value = (remaining > 0.0) == (entry.coef > 0.0);
            let headroom = if raises_value {
                self.problem.upper(entry.col) - v
            } else {
                v - self.problem.lower(entry.col)
            };
            let room = (entry.coef.abs() * headroom).max(0.0);
            let covered = remaining.abs().min(room).copysign(remaining);
            if covered == 0.0 {
                continue;
            }
            steps.push((entry.col, covered / entry.coef));
            remaining -= covered;
        }

        if remaining.abs() > tol {
            return Err(RoundingError::SingletonResidual {
                row: self.problem.row_name(i).to_string(),
                residual: remaining,
            });
        }
        Ok(steps)
    }

    /// Confirms that moving `x[j]` by `signed` keeps it within bounds and
    /// every row it touches satisfiable, counting the room its singletons have.
    pub fn check_shift(&self, state: &SolutionState, j: usize, signed: f64) -> Result<(), RoundingError> {
        let problem = self.problem;
        let target = state.x[j] + signed;
        let (l, u) = (problem.lower(j), problem.upper(j));
        if target < l - self.tolerance || target > u + self.tolerance {
            return Err(self.infeasible(j, signed, format!("bounds [{l}, {u}]")));
        }

        for (i, a) in problem.matrix().column(j) {
            let new = state.slack[i] - a * signed;
            let tol = self.row_tolerance(i);
            let (room_down, room_up) = match self.covering(i) {
                Some(index) => (
                    (state.ss_val[i] - index.lower(i)).max(0.0),
                    (index.upper(i) - state.ss_val[i]).max(0.0),
                ),
                None => (0.0, 0.0),
            };
            let ok = match problem.row_sense(i) {
                RowSense::Le => new + room_down >= -tol,
                RowSense::Ge => new - room_up <= tol,
                RowSense::Eq => match self.covering(i) {
                    Some(index) => {
                        let next = state.ss_val[i] + new;
                        next >= index.lower(i) - tol && next <= index.upper(i) + tol
                    }
                    None => new.abs() <= tol,
                },
            };
            if !ok {
                return Err(self.infeasible(j, signed, format!("constraint {}", problem.row_name(i))));
            }
        }
        Ok(())
    }

    /// Objective change that [`SlackUpdater::apply_shift`] would cause,
    /// singleton movement included. Nothing is mutated.
    pub fn objective_change(&self, state: &SolutionState, j: usize, signed: f64) -> Result<f64, RoundingError> {
        let mut change = self.problem.objective(j) * signed;
        for (i, a) in self.problem.matrix().column(j) {
            let routing = self.route(state, i, a * signed)?;
            if routing.to_singletons != 0.0 {
                for (col, step) in self.plan_cover(&state.x, i, routing.to_singletons)? {
                    change += self.problem.objective(col) * step;
                }
            }
        }
        Ok(change)
    }

    /// Moves `x[j]` by `signed` and updates every row containing `j`.
    ///
    /// The new value is snapped onto an integer when it lands within
    /// tolerance of one.
    pub fn apply_shift(&self, state: &mut SolutionState, j: usize, signed: f64) -> Result<(), RoundingError> {
        state.x[j] = snap(state.x[j] + signed, self.tolerance);
        state.objval += self.problem.objective(j) * signed;

        for (i, a) in self.problem.matrix().column(j) {
            let routing = self.route(state, i, a * signed)?;
            state.slack[i] = routing.slack;
            if routing.to_singletons != 0.0 {
                self.distribute(state, i, routing.to_singletons)?;
            }

            let s = state.slack[i];
            let tol = self.row_tolerance(i);
            let ok = match self.problem.row_sense(i) {
                RowSense::Le => s >= -tol,
                RowSense::Ge => s <= tol,
                RowSense::Eq => s.abs() <= tol,
            };
            if !ok {
                return Err(self.infeasible(
                    j,
                    signed,
                    format!("constraint {} (slack {s})", self.problem.row_name(i)),
                ));
            }
        }
        Ok(())
    }

    /// Shifts row `i`'s singleton aggregate by `delta`, spreading the change
    /// over its singletons in ascending column order.
    pub fn distribute(&self, state: &mut SolutionState, i: usize, delta: f64) -> Result<(), RoundingError> {
        let Some(index) = self.covering(i) else {
            return Err(RoundingError::SingletonResidual {
                row: self.problem.row_name(i).to_string(),
                residual: delta,
            });
        };

        let next = state.ss_val[i] + delta;
        let tol = self.row_tolerance(i);
        if next < index.lower(i) - tol || next > index.upper(i) + tol {
            return Err(RoundingError::SingletonRange {
                row: self.problem.row_name(i).to_string(),
                value: next,
                lower: index.lower(i),
                upper: index.upper(i),
            });
        }

        for (col, step) in self.plan_cover(&state.x, i, delta)? {
            let moved = (state.x[col] + step).clamp(self.problem.lower(col), self.problem.upper(col));
            state.objval += self.problem.objective(col) * (moved - state.x[col]);
            state.x[col] = moved;
        }
        state.ss_val[i] = next;
        tracing::trace!(row = self.problem.row_name(i), delta, "distributed slack to singletons");
        Ok(())
    }

    fn infeasible(&self, j: usize, delta: f64, what: String) -> RoundingError {
        RoundingError::InfeasibleShift {
            var: self.problem.var_name(j).to_string(),
            delta,
            what,
        }
    }
}
