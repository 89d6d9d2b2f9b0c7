#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RelaxationStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot budget ran out before optimality was proven
    IterationLimit,
}

/// Solution of the continuous relaxation
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relaxation {
    pub status: RelaxationStatus,
    pub values: Vec<f64>,
    pub objective_value: f64,
}

impl Relaxation {
    pub fn infeasible() -> Self {
        Self {
            status: RelaxationStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::INFINITY,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            status: RelaxationStatus::Unbounded,
            values: Vec::new(),
            objective_value: f64::NEG_INFINITY,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == RelaxationStatus::Optimal
    }
}
