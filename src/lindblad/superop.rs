// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Explicit Liouvillian superoperator.
//!
//! Density matrices are vectorized by stacking columns, vec(ρ)[i + j·N] = ρ[i, j],
//! so that vec(A ρ B) = (Bᵀ ⊗ A) vec(ρ). The generator becomes the N² × N² matrix
//!
//!   𝓛 = −i (I ⊗ H − Hᵀ ⊗ I)
//!       + Σ_k γ_k (L̄_k ⊗ L_k − ½ I ⊗ L_k†L_k − ½ (L_k†L_k)ᵀ ⊗ I)
//!
//! Memory grows as N⁴, so this form is only used for small systems.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use super::generator::LindbladGenerator;
use crate::error::{Error, Result};
use crate::linalg::ops::{identity, kron, require_dim};
use crate::linalg::matrix_exp;

/// Column-stacked vector of a square matrix.
pub fn vectorize(m: &Array2<Complex64>) -> Array1<Complex64> {
    // Transposed view iterated in logical order visits columns first.
    m.t().iter().copied().collect()
}

/// Inverse of [`vectorize`].
pub fn unvectorize(v: &Array1<Complex64>, dim: usize) -> Result<Array2<Complex64>> {
    if v.len() != dim * dim {
        return Err(Error::DimensionMismatch {
            operation: "unvectorize".into(),
            expected: dim * dim,
            actual: v.len(),
        });
    }
    Ok(Array2::from_shape_fn((dim, dim), |(i, j)| v[i + j * dim]))
}

/// The generator as an explicit matrix acting on vec(ρ).
#[derive(Debug, Clone)]
pub struct Liouvillian {
    matrix: Array2<Complex64>,
    dim: usize,
}

impl Liouvillian {
    pub fn from_generator(generator: &LindbladGenerator) -> Self {
        let n = generator.dim();
        let eye = identity(n);
        let h = generator.hamiltonian().matrix();
        let minus_i = Complex64::new(0.0, -1.0);
        let half = Complex64::new(0.5, 0.0);

        let mut matrix = (kron(&eye, h) - kron(&h.t().to_owned(), &eye)) * minus_i;
        for (gamma, l, l_dag_l) in generator.channel_terms() {
            if gamma == 0.0 {
                continue;
            }
            let jump = kron(&l.mapv(|z| z.conj()), l);
            let left = kron(&eye, l_dag_l);
            let right = kron(&l_dag_l.t().to_owned(), &eye);
            matrix = matrix + (jump - (left + right) * half) * Complex64::new(gamma, 0.0);
        }
        Self { matrix, dim: n }
    }

    /// Hilbert-space dimension N (the matrix is N² × N²).
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    /// 𝓛(ρ), reshaped back to N × N.
    pub fn apply(&self, rho: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        require_dim(rho, self.dim, "liouvillian")?;
        unvectorize(&self.matrix.dot(&vectorize(rho)), self.dim)
    }

    /// exp(𝓛 Δt).
    pub fn propagator(&self, dt: f64) -> Result<Propagator> {
        let scaled = &self.matrix * Complex64::new(dt, 0.0);
        Ok(Propagator {
            matrix: matrix_exp(&scaled)?,
            dim: self.dim,
            dt,
        })
    }
}

/// Exact one-interval evolution map for a fixed Δt.
#[derive(Debug, Clone)]
pub struct Propagator {
    matrix: Array2<Complex64>,
    dim: usize,
    dt: f64,
}

impl Propagator {
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// ρ(t + Δt) from ρ(t).
    pub fn apply(&self, rho: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        require_dim(rho, self.dim, "propagator")?;
        unvectorize(&self.matrix.dot(&vectorize(rho)), self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::{lowering, number};
    use crate::state::{CollapseOperator, HermitianOperator};
    use crate::test_utils::{assert_matrix_close, c, random_hermitian};
    use crate::tolerance::Tolerances;
    use approx::assert_relative_eq;

    fn generator(dim: usize, seed: u64) -> LindbladGenerator {
        let tol = Tolerances::default();
        let h = HermitianOperator::new("h", random_hermitian(dim, seed), &tol).unwrap();
        let ops = vec![
            CollapseOperator::new("a", lowering(dim), 0.3).unwrap(),
            CollapseOperator::new("n", number(dim), 0.05).unwrap(),
        ];
        LindbladGenerator::new(h, ops).unwrap()
    }

    #[test]
    fn test_vectorize_is_column_major() {
        let mut m = Array2::zeros((2, 2));
        m[[0, 1]] = c(2.0);
        m[[1, 0]] = c(3.0);
        let v = vectorize(&m);
        assert_eq!(v[1], c(3.0));
        assert_eq!(v[2], c(2.0));
        assert_eq!(unvectorize(&v, 2).unwrap(), m);
        assert!(unvectorize(&v, 3).is_err());
    }

    #[test]
    fn test_liouvillian_matches_closure_form() {
        let gen = generator(3, 21);
        let liouvillian = Liouvillian::from_generator(&gen);
        let rho = random_hermitian(3, 22);
        assert_matrix_close(
            &liouvillian.apply(&rho).unwrap(),
            &gen.rhs(&rho).unwrap(),
            1e-13,
        );
    }

    #[test]
    fn test_propagator_decays_excited_population() {
        let op = CollapseOperator::new("T1", lowering(2), 0.5).unwrap();
        let gen = LindbladGenerator::new(HermitianOperator::zero(2), vec![op]).unwrap();
        let prop = Liouvillian::from_generator(&gen).propagator(2.0).unwrap();

        let mut rho = Array2::zeros((2, 2));
        rho[[1, 1]] = c(1.0);
        let out = prop.apply(&rho).unwrap();
        assert_relative_eq!(out[[1, 1]].re, (-1.0f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(out[[0, 0]].re, 1.0 - (-1.0f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(prop.dt(), 2.0);
    }

    #[test]
    fn test_zero_step_propagator_is_identity() {
        let gen = generator(2, 5);
        let prop = Liouvillian::from_generator(&gen).propagator(0.0).unwrap();
        let rho = random_hermitian(2, 6);
        assert_matrix_close(&prop.apply(&rho).unwrap(), &rho, 1e-15);
    }
}
