// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hermitian eigendecomposition by cyclic complex Jacobi rotations.
//!
//! Each rotation first removes the phase of the pivot element with a
//! diagonal unitary, then applies the classical real Jacobi rotation to the
//! resulting real symmetric 2×2 block. Eigenvectors accumulate as the
//! product of rotations and stay orthonormal to rounding error.
//!
//! Ref: Golub & Van Loan, "Matrix Computations" (4th ed., 2013), §8.5.
//! Ref: Press et al., "Numerical Recipes" (2007), §11.1.

use ndarray::Array2;
use num_complex::Complex64;

use super::ops::{
    dagger, frobenius_norm, hermitian_part, hermiticity_deviation, identity, require_square,
};
use crate::error::{Error, Result};

/// Sweeps before reporting non-convergence.
const MAX_SWEEPS: usize = 64;

/// Relative off-diagonal norm at which the iteration stops.
const CONVERGENCE: f64 = 1e-15;

/// Eigenvalues in ascending order with matching eigenvector columns.
#[derive(Debug, Clone)]
pub struct Eigh {
    /// Real eigenvalues, ascending.
    pub values: Vec<f64>,
    /// Column `k` is the normalized eigenvector for `values[k]`.
    pub vectors: Array2<Complex64>,
}

impl Eigh {
    /// Rebuild V · diag(f(λ)) · V†.
    pub fn map_spectrum<F>(&self, f: F) -> Array2<Complex64>
    where
        F: Fn(f64) -> f64,
    {
        let n = self.values.len();
        let mut scaled = self.vectors.clone();
        for (k, &lambda) in self.values.iter().enumerate() {
            let w = Complex64::new(f(lambda), 0.0);
            for i in 0..n {
                scaled[[i, k]] *= w;
            }
        }
        scaled.dot(&dagger(&self.vectors))
    }
}

/// Eigendecomposition of a Hermitian matrix.
///
/// Fails with `NonHermitianInput` when any |M_ij − conj(M_ji)| exceeds
/// `hermiticity_tol`. Within tolerance the Hermitian part is decomposed.
pub fn eigh(m: &Array2<Complex64>, hermiticity_tol: f64) -> Result<Eigh> {
    let n = require_square(m, "eigh")?;
    let deviation = hermiticity_deviation(m);
    if deviation > hermiticity_tol {
        return Err(Error::NonHermitianInput { deviation });
    }
    if n == 0 {
        return Ok(Eigh {
            values: vec![],
            vectors: Array2::zeros((0, 0)),
        });
    }

    let mut a = hermitian_part(m);
    let mut v = identity(n);
    // Rounding refills the off-diagonal at roughly n·ε·‖A‖ per sweep
    let threshold = CONVERGENCE * n as f64 * frobenius_norm(&a).max(f64::MIN_POSITIVE);

    let mut converged = false;
    for _ in 0..MAX_SWEEPS {
        if off_diagonal_norm(&a) <= threshold {
            converged = true;
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                rotate(&mut a, &mut v, p, q);
            }
        }
    }
    if !converged && off_diagonal_norm(&a) > threshold * 1e3 {
        return Err(Error::NumericalInstability(format!(
            "Jacobi eigendecomposition did not converge in {MAX_SWEEPS} sweeps"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[i, i]].re.total_cmp(&a[[j, j]].re));

    let values = order.iter().map(|&k| a[[k, k]].re).collect();
    let mut vectors = Array2::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        vectors.column_mut(dst).assign(&v.column(src));
    }
    Ok(Eigh { values, vectors })
}

/// Eigenvalues only, ascending.
pub fn eigvalsh(m: &Array2<Complex64>, hermiticity_tol: f64) -> Result<Vec<f64>> {
    Ok(eigh(m, hermiticity_tol)?.values)
}

fn off_diagonal_norm(a: &Array2<Complex64>) -> f64 {
    a.indexed_iter()
        .filter(|((i, j), _)| i != j)
        .map(|(_, z)| z.norm_sqr())
        .sum::<f64>()
        .sqrt()
}

/// Zero a[p, q] with A ← J†AJ and accumulate V ← VJ.
fn rotate(a: &mut Array2<Complex64>, v: &mut Array2<Complex64>, p: usize, q: usize) {
    let apq = a[[p, q]];
    let mag = apq.norm();
    if mag == 0.0 {
        return;
    }
    let phase = (apq / mag).conj();
    let app = a[[p, p]].re;
    let aqq = a[[q, q]].re;

    let theta = (aqq - app) / (2.0 * mag);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let cos = 1.0 / (t * t + 1.0).sqrt();
    let sin = t * cos;

    // J = diag(1, e^{-iφ}) on (p, q) followed by the real rotation
    let j_pp = Complex64::new(cos, 0.0);
    let j_pq = Complex64::new(sin, 0.0);
    let j_qp = phase * -sin;
    let j_qq = phase * cos;

    let n = a.nrows();
    for k in 0..n {
        let akp = a[[k, p]];
        let akq = a[[k, q]];
        a[[k, p]] = akp * j_pp + akq * j_qp;
        a[[k, q]] = akp * j_pq + akq * j_qq;
    }
    for k in 0..n {
        let apk = a[[p, k]];
        let aqk = a[[q, k]];
        a[[p, k]] = j_pp.conj() * apk + j_qp.conj() * aqk;
        a[[q, k]] = j_pq.conj() * apk + j_qq.conj() * aqk;
    }
    for k in 0..n {
        let vkp = v[[k, p]];
        let vkq = v[[k, q]];
        v[[k, p]] = vkp * j_pp + vkq * j_qp;
        v[[k, q]] = vkp * j_pq + vkq * j_qq;
    }

    a[[p, q]] = Complex64::new(0.0, 0.0);
    a[[q, p]] = Complex64::new(0.0, 0.0);
    a[[p, p]] = Complex64::new(app - t * mag, 0.0);
    a[[q, q]] = Complex64::new(aqq + t * mag, 0.0);
}
