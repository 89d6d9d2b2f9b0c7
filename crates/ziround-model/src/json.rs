//! JSON model and point files.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use ziround_core::{ObjSense, Problem, RowSense, VarKind};

use crate::Model;
use crate::error::ModelError;

/// Serialized form of a model.
///
/// A missing `lower` means 0 and a missing `upper` means no upper bound;
/// an explicit `null` lower bound means no lower bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sense: ObjSense,
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default = "zero")]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
    #[serde(default)]
    pub objective: f64,
    #[serde(default)]
    pub kind: VarKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub name: String,
    pub terms: Vec<TermSpec>,
    pub sense: RowSense,
    pub rhs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermSpec {
    pub var: String,
    pub coef: f64,
}

fn zero() -> Option<f64> {
    Some(0.0)
}

impl ModelFile {
    /// Compiles the file into a [`Model`], resolving variable names.
    pub fn compile(self) -> Result<Model, ModelError> {
        let mut builder = Problem::builder(self.sense);
        let mut index = HashMap::with_capacity(self.variables.len());
        for var in self.variables {
            let col = builder.add_variable(
                var.name.clone(),
                var.lower.unwrap_or(f64::NEG_INFINITY),
                var.upper.unwrap_or(f64::INFINITY),
                var.objective,
                var.kind,
            );
            index.insert(var.name, col);
        }

        for constraint in self.constraints {
            let terms = constraint
                .terms
                .into_iter()
                .map(|t| match index.get(&t.var) {
                    Some(&col) => Ok((col, t.coef)),
                    None => Err(ModelError::UnknownVariable(t.var)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder.add_constraint(constraint.name, terms, constraint.sense, constraint.rhs);
        }

        let problem = builder.build()?;
        tracing::debug!(
            columns = problem.ncols(),
            rows = problem.nrows(),
            integral = problem.num_integral(),
            "read JSON model"
        );
        Ok(Model {
            name: self.name.unwrap_or_default(),
            problem,
        })
    }
}

pub fn parse_model(source: &str) -> Result<Model, ModelError> {
    serde_json::from_str::<ModelFile>(source)?.compile()
}

pub fn read_model(path: impl AsRef<Path>) -> Result<Model, ModelError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    parse_model(&source)
}

/// A point keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointFile {
    pub values: BTreeMap<String, f64>,
}

impl PointFile {
    pub fn from_values(problem: &Problem, values: &[f64]) -> Self {
        Self {
            values: problem
                .var_names()
                .iter()
                .cloned()
                .zip(values.iter().copied())
                .collect(),
        }
    }

    /// Dense vector in column order. Variables the file does not mention
    /// take 0 clamped into their bounds; unknown names are an error.
    pub fn to_values(&self, problem: &Problem) -> Result<Vec<f64>, ModelError> {
        let index: HashMap<&str, usize> = problem
            .var_names()
            .iter()
            .enumerate()
            .map(|(j, name)| (name.as_str(), j))
            .collect();

        let mut values: Vec<f64> = (0..problem.ncols())
            .map(|j| 0.0_f64.clamp(problem.lower(j), problem.upper(j)))
            .collect();
        for (name, &value) in &self.values {
            let &j = index
                .get(name.as_str())
                .ok_or_else(|| ModelError::UnknownVariable(name.clone()))?;
            values[j] = value;
        }
        Ok(values)
    }
}

pub fn read_point(path: impl AsRef<Path>, problem: &Problem) -> Result<Vec<f64>, ModelError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    serde_json::from_str::<PointFile>(&source)?.to_values(problem)
}
