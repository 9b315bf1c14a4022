// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared numerical helpers for unit tests.

use ndarray::Array2;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use crate::state::library::{pauli_x, pauli_y, pauli_z};

/// Real scalar as a complex number.
pub fn c(re: f64) -> Complex64 {
    Complex64::new(re, 0.0)
}

/// Basis vector |k⟩ in dimension `dim`.
pub fn ket(dim: usize, k: usize) -> Vec<Complex64> {
    let mut v = vec![c(0.0); dim];
    v[k] = c(1.0);
    v
}

/// Panic with the offending entry if any |a_ij − b_ij| exceeds `tol`.
pub fn assert_matrix_close(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) {
    assert_eq!(a.dim(), b.dim(), "shape mismatch");
    for ((idx, x), y) in a.indexed_iter().zip(b.iter()) {
        let diff = (x - y).norm();
        assert!(
            diff <= tol,
            "entry {idx:?} differs: {x} vs {y} (|Δ| = {diff:.3e} > {tol:.3e})"
        );
    }
}

/// Seeded random Hermitian matrix with entries of order one.
pub fn random_hermitian(dim: usize, seed: u64) -> Array2<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m = Array2::zeros((dim, dim));
    for i in 0..dim {
        m[[i, i]] = c(rng.gen_range(-1.0..1.0));
        for j in (i + 1)..dim {
            let z = Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            m[[i, j]] = z;
            m[[j, i]] = z.conj();
        }
    }
    m
}
