// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Standard operators and basis vectors.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::linalg::ops::dagger;

/// Truncated annihilation operator: a|n⟩ = √n |n−1⟩.
///
/// For d = 2 this is σ⁻ = |0⟩⟨1|.
pub fn lowering(dim: usize) -> Array2<Complex64> {
    let mut m = Array2::zeros((dim, dim));
    for n in 1..dim {
        m[[n - 1, n]] = Complex64::new((n as f64).sqrt(), 0.0);
    }
    m
}

/// Truncated creation operator a†.
pub fn raising(dim: usize) -> Array2<Complex64> {
    dagger(&lowering(dim))
}

/// Number operator diag(0, 1, …, d−1).
pub fn number(dim: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((dim, dim), |(i, j)| {
        if i == j {
            Complex64::new(i as f64, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    })
}

/// Basis projector |k⟩⟨k|.
pub fn projector(dim: usize, k: usize) -> Result<Array2<Complex64>> {
    check_index(dim, k)?;
    let mut m = Array2::zeros((dim, dim));
    m[[k, k]] = Complex64::new(1.0, 0.0);
    Ok(m)
}

/// Basis vector |k⟩.
pub fn basis_vector(dim: usize, k: usize) -> Result<Vec<Complex64>> {
    check_index(dim, k)?;
    let mut v = vec![Complex64::new(0.0, 0.0); dim];
    v[k] = Complex64::new(1.0, 0.0);
    Ok(v)
}

pub fn pauli_x() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = Complex64::new(1.0, 0.0);
    m[[1, 0]] = Complex64::new(1.0, 0.0);
    m
}

pub fn pauli_y() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = Complex64::new(0.0, -1.0);
    m[[1, 0]] = Complex64::new(0.0, 1.0);
    m
}

/// σz = |0⟩⟨0| − |1⟩⟨1|.
pub fn pauli_z() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = Complex64::new(1.0, 0.0);
    m[[1, 1]] = Complex64::new(-1.0, 0.0);
    m
}

fn check_index(dim: usize, k: usize) -> Result<()> {
    if k >= dim {
        return Err(Error::DimensionMismatch {
            operation: format!("basis index {k}"),
            expected: dim,
            actual: k + 1,
        });
    }
    Ok(())
}
