//! Continuous relaxation of a [`ziround_core::Problem`].
//!
//! Integrality is dropped and the remaining LP is solved with a dense
//! simplex. An optimal [`Relaxation`] is the usual start point for
//! [`ziround_core::Rounder`].

mod simplex;
mod solution;

pub use simplex::SimplexSolver;
pub use solution::{Relaxation, RelaxationStatus};
