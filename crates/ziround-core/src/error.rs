use thiserror::Error;

/// Malformed problem data, detected once while building a [`crate::Problem`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Problem has no variables")]
    Empty,
    #[error("Variable {name} has invalid bounds: lower ({lower}) > upper ({upper})")]
    InvalidBounds { name: String, lower: f64, upper: f64 },
    #[error("Variable {name} has an invalid {field}")]
    InvalidValue { name: String, field: &'static str },
    #[error("Constraint {name} has a non-finite right-hand side ({rhs})")]
    InvalidRhs { name: String, rhs: f64 },
    #[error("Constraint {row} references unknown variable index {col}")]
    UnknownVariable { row: String, col: usize },
    #[error("Constraint {row} has a non-finite coefficient for variable {var}")]
    InvalidCoefficient { row: String, var: String },
    #[error("Constraint {row} lists variable {var} more than once")]
    DuplicateEntry { row: String, var: String },
}

/// Errors raised by a rounding run.
///
/// Everything except [`RoundingError::Problem`], [`RoundingError::InvalidConfig`]
/// and the start-point variants signals broken internal bookkeeping; the run is
/// aborted instead of continuing with corrupted state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoundingError {
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Start point has {actual} values but the problem has {expected} variables")]
    StartLength { expected: usize, actual: usize },
    #[error("Start value of {var} is {value}, outside [{lower}, {upper}]")]
    StartOutOfBounds { var: String, value: f64, lower: f64, upper: f64 },
    #[error("Start point violates constraint {row}: activity {activity}, rhs {rhs}")]
    StartInfeasible { row: String, activity: f64, rhs: f64 },
    #[error("Shift of {var} by {delta} would violate {what}")]
    InfeasibleShift { var: String, delta: f64, what: String },
    #[error("Equality constraint {row} without singletons received a shift of {amount}")]
    UnabsorbedEquality { row: String, amount: f64 },
    #[error("Singletons of constraint {row} left {residual} unabsorbed")]
    SingletonResidual { row: String, residual: f64 },
    #[error("Singleton aggregate of constraint {row} would reach {value}, outside [{lower}, {upper}]")]
    SingletonRange { row: String, value: f64, lower: f64, upper: f64 },
    #[error("Audit failed: {quantity} is {tracked} but recomputes to {actual}")]
    AuditMismatch { quantity: String, tracked: f64, actual: f64 },
    #[error("Audit failed: {0}")]
    AuditViolation(String),
}
