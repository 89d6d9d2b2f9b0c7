//! Free-format MPS reader.
//!
//! Section keywords start in the first column; data lines are indented and
//! split on whitespace. Names therefore may not contain spaces.

use std::collections::HashMap;
use std::path::Path;

use ziround_core::{ObjSense, Problem, RowSense, VarKind};

use crate::Model;
use crate::error::ModelError;

/// Magnitudes at or above this are read as infinite bounds.
const MPS_INFINITY: f64 = 1e30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    ObjSense,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Objective,
    /// Extra `N` rows, parsed and dropped
    Free,
    Constraint(usize),
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    objective: f64,
    lower: f64,
    upper: f64,
    kind: VarKind,
    lower_set: bool,
}

#[derive(Debug, Clone)]
struct Row {
    name: String,
    sense: RowSense,
    terms: Vec<(usize, f64)>,
    rhs: f64,
    range: Option<f64>,
}

/// Accumulates an MPS file line by line.
#[derive(Debug, Default)]
pub struct MpsReader {
    name: Option<String>,
    sense: ObjSense,
    section: Option<Section>,
    row_kinds: HashMap<String, RowKind>,
    rows: Vec<Row>,
    columns: Vec<Column>,
    column_index: HashMap<String, usize>,
    integer_block: bool,
}

impl MpsReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a complete MPS document.
    pub fn parse(source: &str) -> Result<Model, ModelError> {
        let mut reader = Self::new();
        for (idx, line) in source.lines().enumerate() {
            reader.line(idx + 1, line)?;
            if reader.section == Some(Section::End) {
                break;
            }
        }
        reader.finish()
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<Model, ModelError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
        Self::parse(&source)
    }

    fn line(&mut self, line_no: usize, raw: &str) -> Result<(), ModelError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('*') {
            return Ok(());
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();

        if !raw.starts_with(char::is_whitespace) {
            return self.header(line_no, &tokens);
        }

        match self.section {
            Some(Section::ObjSense) => self.objsense(line_no, tokens[0]),
            Some(Section::Rows) => self.row(line_no, &tokens),
            Some(Section::Columns) => self.column(line_no, &tokens),
            Some(Section::Rhs) => self.rhs(line_no, &tokens),
            Some(Section::Ranges) => self.range(line_no, &tokens),
            Some(Section::Bounds) => self.bound(line_no, &tokens),
            _ => Err(ModelError::parse(line_no, format!("data line outside of a section: '{trimmed}'"))),
        }
    }

    fn header(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ModelError> {
        let keyword = tokens[0].to_ascii_uppercase();
        self.section = Some(match keyword.as_str() {
            "NAME" => {
                self.name = tokens.get(1).map(|s| s.to_string());
                Section::Header
            }
            "OBJSENSE" => {
                if let Some(sense) = tokens.get(1) {
                    self.objsense(line_no, sense)?;
                }
                Section::ObjSense
            }
            "ROWS" => Section::Rows,
            "COLUMNS" => Section::Columns,
            "RHS" => Section::Rhs,
            "RANGES" => Section::Ranges,
            "BOUNDS" => Section::Bounds,
            "ENDATA" => Section::End,
            _ => return Err(ModelError::parse(line_no, format!("unknown section '{}'", tokens[0]))),
        });
        Ok(())
    }

    fn objsense(&mut self, line_no: usize, token: &str) -> Result<(), ModelError> {
        self.sense = match token.to_ascii_uppercase().as_str() {
            "MIN" | "MINIMIZE" => ObjSense::Minimize,
            "MAX" | "MAXIMIZE" => ObjSense::Maximize,
            _ => return Err(ModelError::parse(line_no, format!("unknown objective sense '{token}'"))),
        };
        Ok(())
    }

    fn row(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ModelError> {
        let [kind, name] = tokens else {
            return Err(ModelError::parse(line_no, "expected '<type> <name>' in ROWS"));
        };
        if self.row_kinds.contains_key(*name) {
            return Err(ModelError::parse(line_no, format!("duplicate row '{name}'")));
        }

        let sense = match kind.to_ascii_uppercase().as_str() {
            "N" => {
                let has_objective = self.row_kinds.values().any(|k| *k == RowKind::Objective);
                let kind = if has_objective {
                    tracing::warn!(row = *name, "ignoring additional free row");
                    RowKind::Free
                } else {
                    RowKind::Objective
                };
                self.row_kinds.insert(name.to_string(), kind);
                return Ok(());
            }
            "L" => RowSense::Le,
            "G" => RowSense::Ge,
            "E" => RowSense::Eq,
            _ => return Err(ModelError::parse(line_no, format!("unknown row type '{kind}'"))),
        };

        self.row_kinds
            .insert(name.to_string(), RowKind::Constraint(self.rows.len()));
        self.rows.push(Row {
            name: name.to_string(),
            sense,
            terms: Vec::new(),
            rhs: 0.0,
            range: None,
        });
        Ok(())
    }

    fn column(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ModelError> {
        if tokens.len() >= 3 && tokens[1].trim_matches('\'').eq_ignore_ascii_case("MARKER") {
            match tokens[2].trim_matches('\'').to_ascii_uppercase().as_str() {
                "INTORG" => self.integer_block = true,
                "INTEND" => self.integer_block = false,
                other => return Err(ModelError::parse(line_no, format!("unknown marker '{other}'"))),
            }
            return Ok(());
        }
        if tokens.len() != 3 && tokens.len() != 5 {
            return Err(ModelError::parse(line_no, "expected '<column> <row> <value> [<row> <value>]'"));
        }

        let col = match self.column_index.get(tokens[0]) {
            Some(&col) => col,
            None => {
                let kind = if self.integer_block {
                    VarKind::Integer
                } else {
                    VarKind::Continuous
                };
                self.columns.push(Column {
                    name: tokens[0].to_string(),
                    objective: 0.0,
                    lower: 0.0,
                    upper: f64::INFINITY,
                    kind,
                    lower_set: false,
                });
                self.column_index.insert(tokens[0].to_string(), self.columns.len() - 1);
                self.columns.len() - 1
            }
        };

        for pair in tokens[1..].chunks(2) {
            let value = number(line_no, pair[1])?;
            match self.row_kind(line_no, pair[0])? {
                RowKind::Objective => self.columns[col].objective += value,
                RowKind::Free => {}
                RowKind::Constraint(i) => self.rows[i].terms.push((col, value)),
            }
        }
        Ok(())
    }

    fn rhs(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ModelError> {
        for (row, value) in pairs(line_no, tokens)? {
            match self.row_kind(line_no, row)? {
                RowKind::Constraint(i) => self.rows[i].rhs = value,
                _ => tracing::warn!(row, value, "ignoring right-hand side on objective row"),
            }
        }
        Ok(())
    }

    fn range(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ModelError> {
        for (row, value) in pairs(line_no, tokens)? {
            match self.row_kind(line_no, row)? {
                RowKind::Constraint(i) => self.rows[i].range = Some(value),
                _ => return Err(ModelError::parse(line_no, format!("range on free row '{row}'"))),
            }
        }
        Ok(())
    }

    fn bound(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ModelError> {
        let kind = tokens[0].to_ascii_uppercase();
        let needs_value = matches!(kind.as_str(), "UP" | "LO" | "FX" | "LI" | "UI");
        let (name, value) = match (needs_value, tokens.len()) {
            (true, 4) => (tokens[2], Some(number(line_no, tokens[3])?)),
            (true, 3) => (tokens[1], Some(number(line_no, tokens[2])?)),
            (false, 2) => (tokens[1], None),
            (false, 3 | 4) => (tokens[2], None),
            _ => return Err(ModelError::parse(line_no, format!("malformed {kind} bound"))),
        };
        let col = *self
            .column_index
            .get(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))?;
        let column = &mut self.columns[col];
        let value = value.map(infinite).unwrap_or(0.0);

        match kind.as_str() {
            "UP" | "UI" => {
                column.upper = value;
                if value < 0.0 && column.lower == 0.0 && !column.lower_set {
                    tracing::warn!(column = name, value, "negative upper bound, setting lower bound to -inf");
                    column.lower = f64::NEG_INFINITY;
                }
            }
            "LO" | "LI" => {
                column.lower = value;
                column.lower_set = true;
            }
            "FX" => {
                column.lower = value;
                column.upper = value;
                column.lower_set = true;
            }
            "FR" => {
                column.lower = f64::NEG_INFINITY;
                column.upper = f64::INFINITY;
                column.lower_set = true;
            }
            "MI" => {
                column.lower = f64::NEG_INFINITY;
                column.lower_set = true;
            }
            "PL" => column.upper = f64::INFINITY,
            "BV" => {
                column.kind = VarKind::Binary;
                column.lower = 0.0;
                column.upper = 1.0;
                column.lower_set = true;
            }
            _ => return Err(ModelError::parse(line_no, format!("unknown bound type '{}'", tokens[0]))),
        }
        if matches!(kind.as_str(), "LI" | "UI") {
            column.kind = VarKind::Integer;
        }
        Ok(())
    }

    fn row_kind(&self, line_no: usize, row: &str) -> Result<RowKind, ModelError> {
        self.row_kinds
            .get(row)
            .copied()
            .ok_or_else(|| ModelError::parse(line_no, format!("unknown row '{row}'")))
    }

    /// Compiles the accumulated sections into a [`Model`].
    pub fn finish(self) -> Result<Model, ModelError> {
        let mut builder = Problem::builder(self.sense);
        for column in &self.columns {
            builder.add_variable(
                column.name.clone(),
                column.lower,
                column.upper,
                column.objective,
                column.kind,
            );
        }

        for row in self.rows {
            let Some(range) = row.range.filter(|r| *r != 0.0 || row.sense != RowSense::Eq) else {
                builder.add_constraint(row.name, row.terms, row.sense, row.rhs);
                continue;
            };
            // A ranged row is split into its two sides
            let (sense, other_sense, other_rhs) = match row.sense {
                RowSense::Le => (RowSense::Le, RowSense::Ge, row.rhs - range.abs()),
                RowSense::Ge => (RowSense::Ge, RowSense::Le, row.rhs + range.abs()),
                RowSense::Eq if range > 0.0 => (RowSense::Ge, RowSense::Le, row.rhs + range),
                RowSense::Eq => (RowSense::Le, RowSense::Ge, row.rhs + range),
            };
            builder.add_constraint(format!("{}_range", row.name), row.terms.clone(), other_sense, other_rhs);
            builder.add_constraint(row.name, row.terms, sense, row.rhs);
        }

        let problem = builder.build()?;
        tracing::debug!(
            name = self.name.as_deref().unwrap_or(""),
            columns = problem.ncols(),
            rows = problem.nrows(),
            integral = problem.num_integral(),
            "read MPS model"
        );
        Ok(Model {
            name: self.name.unwrap_or_default(),
            problem,
        })
    }
}

fn number(line_no: usize, token: &str) -> Result<f64, ModelError> {
    token
        .parse::<f64>()
        .map_err(|_| ModelError::parse(line_no, format!("invalid number '{token}'")))
}

fn infinite(value: f64) -> f64 {
    if value >= MPS_INFINITY {
        f64::INFINITY
    } else if value <= -MPS_INFINITY {
        f64::NEG_INFINITY
    } else {
        value
    }
}

/// `[set] row value [row value]`; the set name is optional.
fn pairs<'t>(line_no: usize, tokens: &[&'t str]) -> Result<Vec<(&'t str, f64)>, ModelError> {
    let data = match tokens.len() {
        2 | 4 => tokens,
        3 | 5 => &tokens[1..],
        _ => return Err(ModelError::parse(line_no, "expected '[<set>] <row> <value> [<row> <value>]'")),
    };
    data.chunks(2)
        .map(|pair| Ok((pair[0], number(line_no, pair[1])?)))
        .collect()
}
