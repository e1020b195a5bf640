//! Small dense matrices.
//!
//! Just the operations Bayesian and Cox regression need: transpose,
//! products, Gauss-Jordan inversion and Gaussian-elimination solves, both
//! with partial pivoting. Everything is O(n³) and meant for the handful of
//! covariates these models carry.
//!
//! A pivot whose magnitude is below `1e-12` times the largest absolute
//! entry of the matrix is treated as zero and reported as
//! [`InferenceError::SingularMatrix`].
//!
//! # Examples
//!
//! ```
//! use u_inference::matrix::Matrix;
//!
//! let a = Matrix::new(2, 2, vec![4.0, 7.0, 2.0, 6.0]).unwrap();
//! let inv = a.inverse().unwrap();
//! let id = a.mul_mat(&inv).unwrap();
//! assert!((id[(0, 0)] - 1.0).abs() < 1e-12);
//! assert!(id[(0, 1)].abs() < 1e-12);
//! ```

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// Relative pivot threshold.
const PIVOT_EPS: f64 = 1e-12;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a `rows × cols` matrix from row-major data.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(InferenceError::DimensionMismatch {
                what: "matrix data",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from equal-length rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(InferenceError::DimensionMismatch {
                    what: "matrix row",
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// `n × n` identity.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Row-major backing data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major backing data.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Main diagonal.
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self[(i, i)]).collect()
    }

    /// Transpose.
    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// Matrix product `self · other`.
    pub fn mul_mat(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(InferenceError::DimensionMismatch {
                what: "matrix product",
                expected: self.cols,
                actual: other.rows,
            });
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(i, k)];
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    out[(i, j)] += a * other[(k, j)];
                }
            }
        }
        Ok(out)
    }

    /// Matrix-vector product `self · v`.
    pub fn mul_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if self.cols != v.len() {
            return Err(InferenceError::DimensionMismatch {
                what: "matrix-vector product",
                expected: self.cols,
                actual: v.len(),
            });
        }
        Ok((0..self.rows)
            .map(|i| self.row(i).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Quadratic form `xᵀ · self · x`.
    pub fn quadratic_form(&self, x: &[f64]) -> Result<f64> {
        let ax = self.mul_vec(x)?;
        if ax.len() != x.len() {
            return Err(InferenceError::DimensionMismatch {
                what: "quadratic form",
                expected: self.rows,
                actual: x.len(),
            });
        }
        Ok(x.iter().zip(&ax).map(|(a, b)| a * b).sum())
    }

    /// Adds `value` to every diagonal element.
    pub fn add_diagonal(&mut self, value: f64) {
        for i in 0..self.rows.min(self.cols) {
            self[(i, i)] += value;
        }
    }

    fn require_square(&self, what: &'static str) -> Result<()> {
        if !self.is_square() {
            return Err(InferenceError::DimensionMismatch {
                what,
                expected: self.rows,
                actual: self.cols,
            });
        }
        Ok(())
    }

    fn pivot_threshold(&self) -> f64 {
        let scale = self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        scale * PIVOT_EPS
    }

    /// Inverse by Gauss-Jordan elimination on `[A | I]` with partial
    /// pivoting.
    pub fn inverse(&self) -> Result<Matrix> {
        self.require_square("matrix inverse")?;
        let n = self.rows;
        let threshold = self.pivot_threshold();
        let cols = 2 * n;

        let mut aug = vec![0.0; n * cols];
        for i in 0..n {
            aug[i * cols..i * cols + n].copy_from_slice(self.row(i));
            aug[i * cols + n + i] = 1.0;
        }

        for col in 0..n {
            let (max_row, max_val) = (col..n)
                .map(|r| (r, aug[r * cols + col].abs()))
                .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
            if max_val <= threshold || max_val == 0.0 {
                return Err(InferenceError::SingularMatrix {
                    column: col,
                    pivot: max_val,
                });
            }
            if max_row != col {
                for j in 0..cols {
                    aug.swap(col * cols + j, max_row * cols + j);
                }
            }

            let pivot = aug[col * cols + col];
            for j in 0..cols {
                aug[col * cols + j] /= pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = aug[row * cols + col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..cols {
                    let above = aug[col * cols + j];
                    aug[row * cols + j] -= factor * above;
                }
            }
        }

        let mut inv = Self::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                inv[(i, j)] = aug[i * cols + n + j];
            }
        }
        Ok(inv)
    }

    /// Solves `self · x = b` by Gaussian elimination with partial pivoting
    /// and back substitution.
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>> {
        self.require_square("linear system")?;
        let n = self.rows;
        if b.len() != n {
            return Err(InferenceError::DimensionMismatch {
                what: "right-hand side",
                expected: n,
                actual: b.len(),
            });
        }
        let threshold = self.pivot_threshold();
        let w = n + 1;

        let mut aug = vec![0.0; n * w];
        for i in 0..n {
            aug[i * w..i * w + n].copy_from_slice(self.row(i));
            aug[i * w + n] = b[i];
        }

        for col in 0..n {
            let (max_row, max_val) = (col..n)
                .map(|r| (r, aug[r * w + col].abs()))
                .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
            if max_val <= threshold || max_val == 0.0 {
                return Err(InferenceError::SingularMatrix {
                    column: col,
                    pivot: max_val,
                });
            }
            if max_row != col {
                for j in 0..w {
                    aug.swap(col * w + j, max_row * w + j);
                }
            }
            let pivot = aug[col * w + col];
            for row in (col + 1)..n {
                let factor = aug[row * w + col] / pivot;
                for j in col..w {
                    let above = aug[col * w + j];
                    aug[row * w + j] -= factor * above;
                }
            }
        }

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = aug[i * w + n];
            for j in (i + 1)..n {
                sum -= aug[i * w + j] * x[j];
            }
            x[i] = sum / aug[i * w + i];
        }
        Ok(x)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}
