//! ZI-Round primal heuristic for mixed-integer programs.
//!
//! Given a point that satisfies every row and bound of a [`Problem`] but has
//! fractional integer variables, [`Rounder`] shifts those variables toward
//! integers while keeping the point feasible. The start point usually comes
//! from an LP relaxation solved elsewhere.

pub mod check;
mod config;
mod delta;
mod driver;
mod error;
mod numeric;
mod policy;
mod problem;
mod singleton;
mod slack;
mod solution;
mod sparse;
mod state;

pub use config::{DEFAULT_SHIFT_EPSILON, DEFAULT_TOLERANCE, RoundingConfig};
pub use delta::{DeltaCalculator, Shifts};
pub use driver::{Rounder, RunSummary};
pub use error::{ProblemError, RoundingError};
pub use numeric::{fractionality, is_integral_value};
pub use policy::{Candidate, Direction, Move, Proposal, RoundingPolicy, SkipReason, TieBreak};
pub use problem::{ObjSense, Problem, ProblemBuilder, RowSense, VarKind};
pub use singleton::{SingletonEntry, SingletonIndex};
pub use slack::SlackUpdater;
pub use solution::{ConstraintViolation, PassSummary, RoundingOutcome, Termination};
pub use sparse::SparseMatrix;
pub use state::SolutionState;
