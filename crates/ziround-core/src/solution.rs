/// Why a rounding run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Termination {
    /// A full pass made no shift
    Fixpoint,
    /// `max_rounds` passes were performed
    RoundLimit,
    /// The wall-clock budget ran out between passes
    TimeLimit,
}

/// State of the run at the end of one pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassSummary {
    pub round: usize,
    pub shifts: usize,
    pub objective_value: f64,
    pub fractionality: f64,
    pub num_to_round: usize,
}

/// The result of a rounding run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundingOutcome {
    /// Final value of every variable
    pub values: Vec<f64>,
    /// Raw objective `sum obj_j * x_j` at `values`
    pub objective_value: f64,
    /// Sum of the fractionalities of all integral variables
    pub fractionality: f64,
    /// Integral variables still not within tolerance of an integer
    pub num_unrounded: usize,
    /// Passes performed, including the final pass that found nothing to do
    pub rounds: usize,
    /// Total number of shifts applied
    pub shifts: usize,
    pub termination: Termination,
    pub history: Vec<PassSummary>,
}

impl RoundingOutcome {
    /// Whether every integral variable ended on an integer.
    pub fn is_integral(&self) -> bool {
        self.num_unrounded == 0
    }
}

/// Information about a violated bound or constraint
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintViolation {
    /// Constraint name, or the variable name for bound violations
    pub constraint: String,
    /// Required value (right-hand side or bound)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}
