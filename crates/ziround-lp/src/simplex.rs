//! Dense two-phase simplex for the continuous relaxation of a [`Problem`].
//!
//! Produces the fractional start point the rounding engine works on. The
//! tableau is dense, so this is meant for small and medium models.

use ziround_core::{ObjSense, Problem, RowSense};

use crate::solution::{Relaxation, RelaxationStatus};

/// Consecutive degenerate pivots after which Bland's rule takes over.
const DEGENERATE_PIVOT_LIMIT: usize = 50;

/// Simplex solver for the LP relaxation
pub struct SimplexSolver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for SimplexSolver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

/// How an original variable maps onto non-negative tableau columns.
#[derive(Debug, Clone, Copy)]
enum Mapping {
    /// `x = lower + y`
    Shifted { col: usize, lower: f64 },
    /// `x = upper - y`
    Mirrored { col: usize, upper: f64 },
    /// `x = y_pos - y_neg`
    Free { pos: usize, neg: usize },
}

/// The relaxation rewritten over non-negative variables.
struct StandardForm {
    mapping: Vec<Mapping>,
    n_struct: usize,
    profit: Vec<f64>,
    rows: Vec<(Vec<(usize, f64)>, RowSense, f64)>,
}

impl StandardForm {
    fn build(problem: &Problem) -> Self {
        let mut mapping = Vec::with_capacity(problem.ncols());
        let mut rows = Vec::with_capacity(problem.nrows());
        let mut n_struct = 0;

        for j in 0..problem.ncols() {
            let (l, u) = (problem.lower(j), problem.upper(j));
            let m = if l.is_finite() {
                let col = n_struct;
                n_struct += 1;
                if u.is_finite() {
                    rows.push((vec![(col, 1.0)], RowSense::Le, u - l));
                }
                Mapping::Shifted { col, lower: l }
            } else if u.is_finite() {
                n_struct += 1;
                Mapping::Mirrored {
                    col: n_struct - 1,
                    upper: u,
                }
            } else {
                n_struct += 2;
                Mapping::Free {
                    pos: n_struct - 2,
                    neg: n_struct - 1,
                }
            };
            mapping.push(m);
        }

        // Simplex maximizes, so a minimization objective is negated.
        let sign = match problem.sense() {
            ObjSense::Minimize => -1.0,
            ObjSense::Maximize => 1.0,
        };
        let mut profit = vec![0.0; n_struct];
        for (j, m) in mapping.iter().enumerate() {
            let c = sign * problem.objective(j);
            match *m {
                Mapping::Shifted { col, .. } => profit[col] += c,
                Mapping::Mirrored { col, .. } => profit[col] -= c,
                Mapping::Free { pos, neg } => {
                    profit[pos] += c;
                    profit[neg] -= c;
                }
            }
        }

        for i in 0..problem.nrows() {
            let mut rhs = problem.rhs(i);
            let mut terms = Vec::with_capacity(problem.matrix().row_len(i) + 1);
            for (j, a) in problem.matrix().row(i) {
                match mapping[j] {
                    Mapping::Shifted { col, lower } => {
                        rhs -= a * lower;
                        terms.push((col, a));
                    }
                    Mapping::Mirrored { col, upper } => {
                        rhs -= a * upper;
                        terms.push((col, -a));
                    }
                    Mapping::Free { pos, neg } => {
                        terms.push((pos, a));
                        terms.push((neg, -a));
                    }
                }
            }
            rows.push((terms, problem.row_sense(i), rhs));
        }

        Self {
            mapping,
            n_struct,
            profit,
            rows,
        }
    }

    fn recover(&self, y: &[f64]) -> Vec<f64> {
        self.mapping
            .iter()
            .map(|m| match *m {
                Mapping::Shifted { col, lower } => lower + y[col],
                Mapping::Mirrored { col, upper } => upper - y[col],
                Mapping::Free { pos, neg } => y[pos] - y[neg],
            })
            .collect()
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_struct: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn art_start(&self) -> usize {
        self.n_struct + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}

impl SimplexSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the relaxation (integrality dropped) with the two-phase simplex method
    pub fn solve(&self, problem: &Problem) -> Relaxation {
        let form = StandardForm::build(problem);
        let mut tableau = self.build_tableau(&form);
        tracing::debug!(
            rows = tableau.data.len() - 1,
            cols = tableau.data[0].len() - 1,
            artificial = tableau.n_artificial,
            "built simplex tableau"
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::IterationLimit => {
                    return self.extract(&tableau, &form, problem, RelaxationStatus::IterationLimit);
                }
                _ => return Relaxation::infeasible(),
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => self.extract(&tableau, &form, problem, RelaxationStatus::Optimal),
            SimplexResult::IterationLimit => {
                self.extract(&tableau, &form, problem, RelaxationStatus::IterationLimit)
            }
            SimplexResult::Unbounded => Relaxation::unbounded(),
            SimplexResult::Infeasible => Relaxation::infeasible(),
        }
    }

    fn build_tableau(&self, form: &StandardForm) -> Tableau {
        // Normalize to non-negative right-hand sides first; flipping a row
        // turns <= into >= and vice versa.
        let normalized: Vec<(f64, RowSense, f64)> = form
            .rows
            .iter()
            .map(|(_, sense, rhs)| {
                if *rhs < 0.0 {
                    let flipped = match sense {
                        RowSense::Le => RowSense::Ge,
                        RowSense::Ge => RowSense::Le,
                        RowSense::Eq => RowSense::Eq,
                    };
                    (-1.0, flipped, -rhs)
                } else {
                    (1.0, *sense, *rhs)
                }
            })
            .collect();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, sense, _) in &normalized {
            match sense {
                RowSense::Le => n_slack += 1,
                RowSense::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                RowSense::Eq => n_artificial += 1,
            }
        }

        let n_rows = form.rows.len();
        let total_cols = form.n_struct + n_slack + n_artificial + 1; // +1 for RHS
        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_rows + 1],
            basic_vars: vec![0; n_rows],
            n_struct: form.n_struct,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = form.n_struct;
        let mut artificial_idx = form.n_struct + n_slack;
        for (i, ((terms, _, _), &(sign, sense, rhs))) in form.rows.iter().zip(&normalized).enumerate() {
            for &(col, a) in terms {
                tableau.data[i][col] += sign * a;
            }
            tableau.data[i][total_cols - 1] = rhs;

            match sense {
                RowSense::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                RowSense::Ge => {
                    tableau.data[i][slack_idx] = -1.0;
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                RowSense::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row) holds the reduced profits
        for (j, &p) in form.profit.iter().enumerate() {
            tableau.data[n_rows][j] = p;
        }
        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[obj_row].clone();

        // Maximize -sum(artificials), priced out against the artificial basis
        for j in 0..n_cols {
            tableau.data[obj_row][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            SimplexResult::Optimal => {}
            // Unbounded in phase 1 cannot happen for a bounded auxiliary; treat as infeasible
            SimplexResult::Unbounded | SimplexResult::Infeasible => return SimplexResult::Infeasible,
            SimplexResult::IterationLimit => return SimplexResult::IterationLimit,
        }

        let rhs_col = tableau.rhs_col();
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.feasibility_tolerance() {
                return SimplexResult::Infeasible;
            }
        }

        // Drive zero-level artificials out of the basis; rows where that is
        // impossible are redundant and never change again.
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                if let Some(col) = (0..art_start).find(|&k| tableau.data[i][k].abs() > self.feasibility_tolerance()) {
                    self.pivot(tableau, i, col);
                }
            }
        }

        // Restore original objective and adjust for basic variables
        tableau.data[obj_row] = orig_obj;
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Exclude artificial variable columns from pivoting
        let exclude_from = tableau.art_start();
        self.iterate(tableau, exclude_from)
    }

    fn iterate(&self, tableau: &mut Tableau, n_candidates: usize) -> SimplexResult {
        let mut degenerate_run = 0;
        for _ in 0..self.max_iterations {
            let bland = degenerate_run > DEGENERATE_PIVOT_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, n_candidates, bland) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            if tableau.data[pivot_row][tableau.rhs_col()].abs() <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
            self.pivot(tableau, pivot_row, pivot_col);
        }
        tracing::warn!(max_iterations = self.max_iterations, "simplex iteration limit reached");
        SimplexResult::IterationLimit
    }

    /// Most positive reduced profit, or the first positive one under Bland's rule.
    fn find_pivot_column(&self, tableau: &Tableau, n_candidates: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.obj_row();
        let row = &tableau.data[obj_row][..n_candidates];
        if bland {
            return row.iter().position(|&v| v > self.tolerance);
        }

        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &v) in row.iter().enumerate() {
            if v > max_val {
                max_val = v;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;
        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col].max(0.0) / val;
                let better = match min_row {
                    None => true,
                    Some(r) => {
                        ratio < min_ratio - self.tolerance
                            || (ratio <= min_ratio + self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[r])
                    }
                };
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }
        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        let pivot_row = tableau.data[row].clone();
        for (i, r) in tableau.data.iter_mut().enumerate() {
            if i != row {
                let factor = r[col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        r[j] -= factor * pivot_row[j];
                    }
                }
            }
        }
    }

    fn extract(&self, tableau: &Tableau, form: &StandardForm, problem: &Problem, status: RelaxationStatus) -> Relaxation {
        let rhs_col = tableau.rhs_col();
        let mut y = vec![0.0; form.n_struct];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < form.n_struct {
                y[basic] = tableau.data[i][rhs_col].max(0.0);
            }
        }

        let values: Vec<f64> = form
            .recover(&y)
            .into_iter()
            .enumerate()
            .map(|(j, v)| v.clamp(problem.lower(j), problem.upper(j)))
            .collect();
        let objective_value = problem.objective_value(&values);

        Relaxation {
            status,
            values,
            objective_value,
        }
    }

    fn feasibility_tolerance(&self) -> f64 {
        self.tolerance.max(1e-9) * 1e3
    }
}
