//! Continuous singleton columns grouped by the row they appear in.
//!
//! A singleton can be moved freely inside its bounds without touching any
//! other row, so the rounding engine uses a row's singletons as a reservoir
//! that absorbs activity changes caused by shifting integral variables.

use crate::problem::Problem;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingletonEntry {
    pub col: usize,
    pub coef: f64,
}

/// Per-row singleton groups with aggregate bounds on `sum coef * x`.
///
/// Entries of a row are stored in ascending column order; slack is routed
/// through them in that order.
#[derive(Debug, Clone)]
pub struct SingletonIndex {
    row_begin: Vec<usize>,
    entries: Vec<SingletonEntry>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    is_singleton: Vec<bool>,
}

impl SingletonIndex {
    pub fn build(problem: &Problem) -> Self {
        let matrix = problem.matrix();
        let nrows = problem.nrows();

        let mut by_row: Vec<Vec<SingletonEntry>> = vec![Vec::new(); nrows];
        let mut is_singleton = vec![false; problem.ncols()];
        for j in 0..problem.ncols() {
            if problem.is_integral(j) || matrix.column_len(j) != 1 {
                continue;
            }
            if let Some((row, coef)) = matrix.column(j).next() {
                by_row[row].push(SingletonEntry { col: j, coef });
                is_singleton[j] = true;
            }
        }

        let mut row_begin = Vec::with_capacity(nrows + 1);
        let mut entries = Vec::new();
        let mut lower = vec![0.0; nrows];
        let mut upper = vec![0.0; nrows];
        row_begin.push(0);
        for (i, group) in by_row.into_iter().enumerate() {
            for e in &group {
                let (l, u) = (problem.lower(e.col), problem.upper(e.col));
                if e.coef > 0.0 {
                    lower[i] += e.coef * l;
                    upper[i] += e.coef * u;
                } else {
                    lower[i] += e.coef * u;
                    upper[i] += e.coef * l;
                }
            }
            entries.extend(group);
            row_begin.push(entries.len());
        }

        tracing::debug!(
            singletons = entries.len(),
            rows_covered = (0..nrows).filter(|&i| row_begin[i + 1] > row_begin[i]).count(),
            "built singleton index"
        );

        Self {
            row_begin,
            entries,
            lower,
            upper,
            is_singleton,
        }
    }

    pub fn row(&self, i: usize) -> &[SingletonEntry] {
        &self.entries[self.row_begin[i]..self.row_begin[i + 1]]
    }

    pub fn has_singletons(&self, i: usize) -> bool {
        self.row_begin[i + 1] > self.row_begin[i]
    }

    pub fn is_singleton(&self, j: usize) -> bool {
        self.is_singleton[j]
    }

    /// Smallest achievable `sum coef * x` over the singletons of row `i`.
    pub fn lower(&self, i: usize) -> f64 {
        self.lower[i]
    }

    pub fn upper(&self, i: usize) -> f64 {
        self.upper[i]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current weighted sum of row `i`'s singletons.
    pub fn value(&self, i: usize, x: &[f64]) -> f64 {
        self.row(i).iter().map(|e| e.coef * x[e.col]).sum()
    }
}
