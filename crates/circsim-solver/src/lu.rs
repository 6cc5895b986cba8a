//! Dense LU factorization with partial pivoting.
//!
//! Hand-rolled rather than delegated to a linear-algebra crate's `LU` — the
//! pivot threshold, singular-column error message, and condition estimator
//! are all part of the documented contract, not incidental to whatever a
//! library happens to do.

use circsim_core::{Error, Matrix, Result, Vector};

/// Below this pivot magnitude the matrix is treated as singular.
pub const SINGULAR_THRESHOLD: f64 = 1e-14;

/// An in-place LU factorization of a square matrix, with the row
/// permutation recorded separately from the combined `L`/`U` storage.
#[derive(Debug, Clone)]
pub struct LuFactorization {
    /// Combined lower (unit diagonal, implicit) and upper factors.
    lu: Matrix,
    /// `perm[i]` is the original row now stored at position `i`.
    perm: Vec<usize>,
    n: usize,
}

impl LuFactorization {
    /// Factorize `a` in place (on a clone) with partial pivoting.
    pub fn factorize(a: &Matrix) -> Result<Self> {
        let n = a.rows();
        if a.cols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: a.cols(),
            });
        }
        let mut lu = a.clone();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            let mut max_val = lu.get(k, k).abs();
            let mut max_row = k;
            for i in (k + 1)..n {
                let v = lu.get(i, k).abs();
                if v > max_val {
                    max_val = v;
                    max_row = i;
                }
            }
            if max_val < SINGULAR_THRESHOLD {
                log::warn!("LU factorization failed: pivot at column {k} is {max_val:.2e}, below the singularity threshold");
                return Err(Error::Singular { column: k });
            }
            if max_row != k {
                lu.swap_rows(k, max_row);
                perm.swap(k, max_row);
            }
            let pivot = lu.get(k, k);
            for i in (k + 1)..n {
                let mult = lu.get(i, k) / pivot;
                lu.set(i, k, mult);
                for j in (k + 1)..n {
                    let updated = lu.get(i, j) - mult * lu.get(k, j);
                    lu.set(i, j, updated);
                }
            }
        }

        Ok(Self { lu, perm, n })
    }

    /// Forward + backward substitution against `b`.
    pub fn solve(&self, b: &Vector) -> Result<Vector> {
        if b.len() != self.n {
            return Err(Error::DimensionMismatch {
                expected: self.n,
                actual: b.len(),
            });
        }
        let mut y = vec![0.0; self.n];
        for i in 0..self.n {
            y[i] = b.get(self.perm[i]);
        }
        // Forward substitution on the unit-lower L.
        for i in 0..self.n {
            let mut sum = y[i];
            for j in 0..i {
                sum -= self.lu.get(i, j) * y[j];
            }
            y[i] = sum;
        }
        // Backward substitution on U.
        let mut x = vec![0.0; self.n];
        for ii in 0..self.n {
            let i = self.n - 1 - ii;
            let mut sum = y[i];
            for j in (i + 1)..self.n {
                sum -= self.lu.get(i, j) * x[j];
            }
            x[i] = sum / self.lu.get(i, i);
        }
        Ok(Vector::from(x))
    }

    /// `max|diag| / min|diag|` of U, or `+inf` if any diagonal entry is
    /// below the singularity threshold.
    pub fn condition_estimate(&self) -> f64 {
        let mut min_d = f64::INFINITY;
        let mut max_d = 0.0_f64;
        for i in 0..self.n {
            let d = self.lu.get(i, i).abs();
            if d < SINGULAR_THRESHOLD {
                return f64::INFINITY;
            }
            min_d = min_d.min(d);
            max_d = max_d.max(d);
        }
        max_d / min_d
    }
}

/// Convenience one-shot solve: `factorize` then `solve`.
pub fn solve(a: &Matrix, b: &Vector) -> Result<Vector> {
    LuFactorization::factorize(a)?.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_reproduces_b() {
        let mut a = Matrix::zeros(3, 3);
        for i in 0..3 {
            a.set(i, i, 1.0);
        }
        let b = Vector::from(vec![1.0, 2.0, 3.0]);
        let x = solve(&a, &b).unwrap();
        assert_eq!(x.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn requires_pivoting() {
        // A zero (0,0) pivot forces a row swap.
        let mut a = Matrix::zeros(2, 2);
        a.set(0, 0, 0.0);
        a.set(0, 1, 1.0);
        a.set(1, 0, 1.0);
        a.set(1, 1, 1.0);
        let b = Vector::from(vec![1.0, 2.0]);
        let x = solve(&a, &b).unwrap();
        // x1 = 1, x0 + x1 = 2 => x0 = 1
        assert!((x.get(0) - 1.0).abs() < 1e-9);
        assert!((x.get(1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn singular_matrix_errors() {
        let a = Matrix::zeros(2, 2);
        let b = Vector::zeros(2);
        assert!(matches!(solve(&a, &b), Err(Error::Singular { column: 0 })));
    }

    #[test]
    fn well_conditioned_random_system_is_accurate() {
        let a_data = [[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 5.0]];
        let mut a = Matrix::zeros(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                a.set(i, j, a_data[i][j]);
            }
        }
        let b = Vector::from(vec![1.5, -2.0, 3.25]);
        let x = solve(&a, &b).unwrap();
        // Residual check: A*x - b should be tiny.
        for i in 0..3 {
            let mut row_sum = 0.0;
            for j in 0..3 {
                row_sum += a_data[i][j] * x.get(j);
            }
            assert!((row_sum - b.get(i)).abs() < 1e-9);
        }
    }
}
