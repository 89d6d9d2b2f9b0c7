use std::time::Duration;

use crate::error::RoundingError;

/// Values within this distance of an integer or a bound count as on it.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
/// Smallest shift considered worth applying to a fractional variable.
pub const DEFAULT_SHIFT_EPSILON: f64 = 1e-5;

/// Knobs recognized by the rounding engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoundingConfig {
    /// Let continuous singleton columns absorb slack changes
    pub singletons_enabled: bool,
    /// Also move variables that are already integral when that improves the objective
    pub shift_non_fractional_vars: bool,
    /// Hold integral-variable moves back until every variable is rounded
    pub wait_until_zero_fractionality: bool,
    /// Break fractional ties toward the worse objective instead of the better one
    pub fractional_tie_break_worst_objective: bool,
    /// Maximum number of passes; 0 means unlimited
    pub max_rounds: usize,
    pub tolerance: f64,
    pub shift_epsilon: f64,
    /// Wall-clock budget, checked between passes
    pub time_limit: Option<Duration>,
    /// Recompute all invariants from scratch after every pass
    pub audit: bool,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            singletons_enabled: false,
            shift_non_fractional_vars: false,
            wait_until_zero_fractionality: false,
            fractional_tie_break_worst_objective: false,
            max_rounds: 0,
            tolerance: DEFAULT_TOLERANCE,
            shift_epsilon: DEFAULT_SHIFT_EPSILON,
            time_limit: None,
            audit: false,
        }
    }
}

impl RoundingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_singletons(mut self, enabled: bool) -> Self {
        self.singletons_enabled = enabled;
        self
    }

    pub fn with_shift_non_fractional(mut self, enabled: bool) -> Self {
        self.shift_non_fractional_vars = enabled;
        self
    }

    pub fn with_wait_until_zero_fractionality(mut self, enabled: bool) -> Self {
        self.wait_until_zero_fractionality = enabled;
        self
    }

    pub fn with_worst_objective_tie_break(mut self, enabled: bool) -> Self {
        self.fractional_tie_break_worst_objective = enabled;
        self
    }

    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_shift_epsilon(mut self, eps: f64) -> Self {
        self.shift_epsilon = eps;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), RoundingError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(RoundingError::InvalidConfig(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if !(self.shift_epsilon.is_finite() && self.shift_epsilon > 0.0) {
            return Err(RoundingError::InvalidConfig(format!(
                "shift epsilon must be positive and finite, got {}",
                self.shift_epsilon
            )));
        }
        if self.shift_epsilon >= 1.0 {
            return Err(RoundingError::InvalidConfig(format!(
                "shift epsilon must be below 1, got {}",
                self.shift_epsilon
            )));
        }
        Ok(())
    }
}
