//! Dense linear algebra for the joint-space solve
//!
//! The systems solved here are small (6 + joint count) and symmetric
//! positive definite, so a row-major matrix with an in-place Cholesky
//! factorization is all the step needs.

use std::ops::{Index, IndexMut};

/// Square row-major matrix
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    size: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// `self * x`
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        self.data
            .chunks_exact(self.size.max(1))
            .take(self.size)
            .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// Overwrite the lower triangle with `L` such that `L Lᵀ = self`
    ///
    /// Returns `None` when the matrix is not positive definite; the
    /// contents are unspecified in that case.
    pub fn cholesky_in_place(&mut self) -> Option<()> {
        let n = self.size;
        for j in 0..n {
            let mut diag = self[(j, j)];
            for k in 0..j {
                diag -= self[(j, k)] * self[(j, k)];
            }
            if diag.is_nan() || diag <= 0.0 {
                return None;
            }
            let ljj = diag.sqrt();
            self[(j, j)] = ljj;

            for i in (j + 1)..n {
                let mut sum = self[(i, j)];
                for k in 0..j {
                    sum -= self[(i, k)] * self[(j, k)];
                }
                self[(i, j)] = sum / ljj;
            }
        }
        Some(())
    }

    /// Solve `L Lᵀ x = b` in place with `L` from [`Self::cholesky_in_place`]
    pub fn cholesky_solve_in_place(&self, x: &mut [f64]) {
        let n = self.size;
        for j in 0..n {
            for k in 0..j {
                x[j] -= self[(j, k)] * x[k];
            }
            x[j] /= self[(j, j)];
        }
        for j in (0..n).rev() {
            for k in (j + 1)..n {
                x[j] -= self[(k, j)] * x[k];
            }
            x[j] /= self[(j, j)];
        }
    }

    /// Solve `self * x = b` for a symmetric positive definite matrix
    pub fn solve_spd(mut self, mut b: Vec<f64>) -> Option<Vec<f64>> {
        self.cholesky_in_place()?;
        self.cholesky_solve_in_place(&mut b);
        Some(b)
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.size + col]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * self.size + col]
    }
}
