//! Constraint matrix storage.
//!
//! Coefficients live once, in row-major (CSR) order. The column view is a
//! transpose index that maps each column to `(row, position)` pairs pointing
//! back into the CSR value array.

/// A sparse matrix with both row and column access.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    row_begin: Vec<usize>,
    col_index: Vec<usize>,
    values: Vec<f64>,
    col_begin: Vec<usize>,
    col_row: Vec<usize>,
    col_entry: Vec<usize>,
}

impl SparseMatrix {
    /// Builds the matrix from per-row `(column, coefficient)` lists.
    ///
    /// Entries are kept in the order given; callers are expected to have
    /// validated column indices and removed duplicates.
    pub fn from_rows(ncols: usize, rows: &[Vec<(usize, f64)>]) -> Self {
        let nrows = rows.len();
        let nnz: usize = rows.iter().map(Vec::len).sum();

        let mut row_begin = Vec::with_capacity(nrows + 1);
        let mut col_index = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_begin.push(0);
        for row in rows {
            for &(col, coef) in row {
                col_index.push(col);
                values.push(coef);
            }
            row_begin.push(col_index.len());
        }

        // Counting sort into columns; rows are visited in order so each
        // column's entries come out sorted by row.
        let mut col_begin = vec![0usize; ncols + 1];
        for &col in &col_index {
            col_begin[col + 1] += 1;
        }
        for j in 0..ncols {
            col_begin[j + 1] += col_begin[j];
        }
        let mut fill = col_begin.clone();
        let mut col_row = vec![0usize; nnz];
        let mut col_entry = vec![0usize; nnz];
        for i in 0..nrows {
            for pos in row_begin[i]..row_begin[i + 1] {
                let col = col_index[pos];
                col_row[fill[col]] = i;
                col_entry[fill[col]] = pos;
                fill[col] += 1;
            }
        }

        Self {
            nrows,
            ncols,
            row_begin,
            col_index,
            values,
            col_begin,
            col_row,
            col_entry,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// `(column, coefficient)` pairs of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_begin[i]..self.row_begin[i + 1];
        self.col_index[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// `(row, coefficient)` pairs of column `j`, in ascending row order.
    pub fn column(&self, j: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.col_begin[j]..self.col_begin[j + 1];
        self.col_row[range.clone()]
            .iter()
            .copied()
            .zip(self.col_entry[range].iter().map(|&pos| self.values[pos]))
    }

    pub fn row_len(&self, i: usize) -> usize {
        self.row_begin[i + 1] - self.row_begin[i]
    }

    pub fn column_len(&self, j: usize) -> usize {
        self.col_begin[j + 1] - self.col_begin[j]
    }

    /// Row activity `sum a_ij * x_j`.
    pub fn row_dot(&self, i: usize, x: &[f64]) -> f64 {
        self.row(i).map(|(j, a)| a * x[j]).sum()
    }
}
