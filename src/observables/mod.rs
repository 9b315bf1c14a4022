// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Expectation values, entropy and state-distance metrics.
//!
//! All functions are read-only in their inputs. Residuals that a valid
//! model cannot produce are reported as `NumericalInstability` rather than
//! clamped.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::linalg::eigh;
use crate::linalg::ops::hermitian_part;
use crate::state::{DensityMatrix, HermitianOperator};
use crate::tolerance::Tolerances;

/// ⟨A⟩ = Tr[A ρ] as a real scalar.
///
/// An imaginary part larger than `tol.imaginary` is a `NumericalInstability`.
pub fn expectation(
    operator: &HermitianOperator,
    state: &DensityMatrix,
    tol: &Tolerances,
) -> Result<f64> {
    if operator.dim() != state.dim() {
        return Err(Error::DimensionMismatch {
            operation: format!("expectation of '{}'", operator.label()),
            expected: state.dim(),
            actual: operator.dim(),
        });
    }
    let value = trace_of_product(operator.matrix(), state.matrix());
    if value.im.abs() > tol.imaginary {
        return Err(Error::NumericalInstability(format!(
            "expectation of '{}' has imaginary part {:.3e}",
            operator.label(),
            value.im
        )));
    }
    Ok(value.re)
}

/// S(ρ) = −Tr[ρ ln ρ] in nats, from the eigenvalues of ρ.
///
/// Zero eigenvalues contribute 0. Eigenvalues below −`tol.positivity` are a
/// `NumericalInstability`; smaller negative rounding is treated as zero.
pub fn von_neumann_entropy(state: &DensityMatrix, tol: &Tolerances) -> Result<f64> {
    let values = state.eigenvalues(tol)?;
    if let Some(&min) = values.first() {
        if min < -tol.positivity {
            return Err(Error::NumericalInstability(format!(
                "entropy of a state with negative eigenvalue {min:.3e}"
            )));
        }
    }
    Ok(values
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum())
}

/// Purity Tr(ρ²).
pub fn purity(state: &DensityMatrix) -> f64 {
    state.purity()
}

/// Uhlmann fidelity F(ρ, σ) = (Tr √(√ρ σ √ρ))².
///
/// Equals Tr(ρσ) when either state is pure.
pub fn state_fidelity(rho: &DensityMatrix, sigma: &DensityMatrix, tol: &Tolerances) -> Result<f64> {
    require_same_dim(rho, sigma, "state_fidelity")?;
    let sqrt_rho = eigh(rho.matrix(), tol.hermiticity)?.map_spectrum(|l| l.max(0.0).sqrt());
    let inner = hermitian_part(&sqrt_rho.dot(sigma.matrix()).dot(&sqrt_rho));
    let root_trace: f64 = eigh(&inner, tol.hermiticity)?
        .values
        .iter()
        .map(|&l| l.max(0.0).sqrt())
        .sum();
    Ok((root_trace * root_trace).min(1.0))
}

/// Trace distance D(ρ, σ) = ½ ‖ρ − σ‖₁ from the eigenvalues of ρ − σ.
pub fn trace_distance(rho: &DensityMatrix, sigma: &DensityMatrix, tol: &Tolerances) -> Result<f64> {
    require_same_dim(rho, sigma, "trace_distance")?;
    let diff = rho.matrix() - sigma.matrix();
    let values = eigh(&diff, tol.hermiticity)?.values;
    Ok(0.5 * values.iter().map(|l| l.abs()).sum::<f64>())
}

/// Hellinger-type distance √(1 − F) from a fidelity value.
pub fn hellinger_distance(fidelity: f64) -> f64 {
    (1.0 - fidelity.clamp(0.0, 1.0)).sqrt()
}

/// Tr[A B] without forming the product.
fn trace_of_product(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Complex64 {
    let n = a.nrows();
    let mut acc = Complex64::new(0.0, 0.0);
    for i in 0..n {
        for j in 0..n {
            acc += a[[i, j]] * b[[j, i]];
        }
    }
    acc
}

fn require_same_dim(rho: &DensityMatrix, sigma: &DensityMatrix, operation: &str) -> Result<()> {
    if rho.dim() != sigma.dim() {
        return Err(Error::DimensionMismatch {
            operation: operation.into(),
            expected: rho.dim(),
            actual: sigma.dim(),
        });
    }
    Ok(())
}
