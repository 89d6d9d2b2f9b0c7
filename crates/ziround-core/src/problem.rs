use crate::error::ProblemError;
use crate::sparse::SparseMatrix;

/// Optimization direction of the objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ObjSense {
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "min"))]
    Minimize,
    #[cfg_attr(feature = "serde", serde(alias = "max"))]
    Maximize,
}

impl ObjSense {
    /// How much an objective change helps: positive is an improvement.
    pub fn gain(self, change: f64) -> f64 {
        match self {
            ObjSense::Minimize => -change,
            ObjSense::Maximize => change,
        }
    }
}

/// Comparison operator of a constraint row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowSense {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<=", alias = "le"))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">=", alias = "ge"))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "=", alias = "eq"))]
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VarKind {
    #[default]
    Continuous,
    Integer,
    /// Integer restricted to `[0, 1]`
    Binary,
}

impl VarKind {
    pub fn is_integral(self) -> bool {
        !matches!(self, VarKind::Continuous)
    }
}

/// An immutable mixed-integer program: bounds, objective, and rows.
///
/// Built through [`ProblemBuilder`], which validates the data once so the
/// rounding engine never has to.
#[derive(Debug, Clone)]
pub struct Problem {
    sense: ObjSense,
    names: Vec<String>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    objective: Vec<f64>,
    kinds: Vec<VarKind>,
    row_names: Vec<String>,
    row_sense: Vec<RowSense>,
    rhs: Vec<f64>,
    matrix: SparseMatrix,
}

impl Problem {
    pub fn builder(sense: ObjSense) -> ProblemBuilder {
        ProblemBuilder::new(sense)
    }

    pub fn ncols(&self) -> usize {
        self.names.len()
    }

    pub fn nrows(&self) -> usize {
        self.row_names.len()
    }

    pub fn sense(&self) -> ObjSense {
        self.sense
    }

    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    pub fn lower(&self, j: usize) -> f64 {
        self.lower[j]
    }

    pub fn upper(&self, j: usize) -> f64 {
        self.upper[j]
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    pub fn objective(&self, j: usize) -> f64 {
        self.objective[j]
    }

    pub fn objective_coefficients(&self) -> &[f64] {
        &self.objective
    }

    pub fn kind(&self, j: usize) -> VarKind {
        self.kinds[j]
    }

    pub fn is_integral(&self, j: usize) -> bool {
        self.kinds[j].is_integral()
    }

    /// Fixed variables (`lower == upper`) are never rounding targets.
    pub fn is_fixed(&self, j: usize) -> bool {
        self.lower[j] == self.upper[j]
    }

    pub fn row_sense(&self, i: usize) -> RowSense {
        self.row_sense[i]
    }

    pub fn rhs(&self, i: usize) -> f64 {
        self.rhs[i]
    }

    pub fn var_name(&self, j: usize) -> &str {
        &self.names[j]
    }

    pub fn var_names(&self) -> &[String] {
        &self.names
    }

    pub fn row_name(&self, i: usize) -> &str {
        &self.row_names[i]
    }

    pub fn num_integral(&self) -> usize {
        self.kinds.iter().filter(|k| k.is_integral()).count()
    }

    /// Raw objective value `sum obj_j * x_j`, independent of the sense.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective.iter().zip(x).map(|(c, v)| c * v).sum()
    }

    pub fn activity(&self, i: usize, x: &[f64]) -> f64 {
        self.matrix.row_dot(i, x)
    }
}

/// Incremental constructor for [`Problem`].
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    sense: ObjSense,
    names: Vec<String>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    objective: Vec<f64>,
    kinds: Vec<VarKind>,
    row_names: Vec<String>,
    rows: Vec<Vec<(usize, f64)>>,
    row_sense: Vec<RowSense>,
    rhs: Vec<f64>,
}

impl ProblemBuilder {
    pub fn new(sense: ObjSense) -> Self {
        Self {
            sense,
            ..Self::default()
        }
    }

    /// Adds a variable and returns its column index.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        objective: f64,
        kind: VarKind,
    ) -> usize {
        self.names.push(name.into());
        self.lower.push(lower);
        self.upper.push(upper);
        self.objective.push(objective);
        self.kinds.push(kind);
        self.names.len() - 1
    }

    /// Adds a constraint row and returns its index. Zero coefficients are dropped.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (usize, f64)>,
        sense: RowSense,
        rhs: f64,
    ) -> usize {
        self.row_names.push(name.into());
        self.rows
            .push(terms.into_iter().filter(|&(_, a)| a != 0.0).collect());
        self.row_sense.push(sense);
        self.rhs.push(rhs);
        self.rows.len() - 1
    }

    pub fn build(mut self) -> Result<Problem, ProblemError> {
        let ncols = self.names.len();
        if ncols == 0 {
            return Err(ProblemError::Empty);
        }

        for j in 0..ncols {
            let name = &self.names[j];
            for (field, bad) in [
                ("lower bound", self.lower[j].is_nan()),
                ("upper bound", self.upper[j].is_nan()),
                ("objective coefficient", !self.objective[j].is_finite()),
            ] {
                if bad {
                    return Err(ProblemError::InvalidValue {
                        name: name.clone(),
                        field,
                    });
                }
            }
            if self.kinds[j] == VarKind::Binary {
                self.lower[j] = self.lower[j].max(0.0);
                self.upper[j] = self.upper[j].min(1.0);
            }
            if self.lower[j] > self.upper[j]
                || self.lower[j] == f64::INFINITY
                || self.upper[j] == f64::NEG_INFINITY
            {
                return Err(ProblemError::InvalidBounds {
                    name: name.clone(),
                    lower: self.lower[j],
                    upper: self.upper[j],
                });
            }
        }

        let mut seen = vec![usize::MAX; ncols];
        for (i, row) in self.rows.iter().enumerate() {
            let row_name = &self.row_names[i];
            if !self.rhs[i].is_finite() {
                return Err(ProblemError::InvalidRhs {
                    name: row_name.clone(),
                    rhs: self.rhs[i],
                });
            }
            for &(col, coef) in row {
                if col >= ncols {
                    return Err(ProblemError::UnknownVariable {
                        row: row_name.clone(),
                        col,
                    });
                }
                if !coef.is_finite() {
                    return Err(ProblemError::InvalidCoefficient {
                        row: row_name.clone(),
                        var: self.names[col].clone(),
                    });
                }
                if seen[col] == i {
                    return Err(ProblemError::DuplicateEntry {
                        row: row_name.clone(),
                        var: self.names[col].clone(),
                    });
                }
                seen[col] = i;
            }
        }

        let matrix = SparseMatrix::from_rows(ncols, &self.rows);
        tracing::debug!(
            ncols,
            nrows = self.rows.len(),
            nnz = matrix.nnz(),
            "built problem"
        );

        Ok(Problem {
            sense: self.sense,
            names: self.names,
            lower: self.lower,
            upper: self.upper,
            objective: self.objective,
            kinds: self.kinds,
            row_names: self.row_names,
            row_sense: self.row_sense,
            rhs: self.rhs,
            matrix,
        })
    }
}
