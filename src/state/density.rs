// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Validated density matrices.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{DensityViolation, Error, Result};
use crate::linalg::ops::{
    frobenius_norm, hermitian_part, hermiticity_deviation, is_finite, kron, outer,
    require_square, trace,
};
use crate::linalg::eigvalsh;
use crate::tolerance::Tolerances;

/// Caller-supplied material for a density matrix.
#[derive(Debug, Clone)]
pub enum StateInput {
    /// State vector |ψ⟩; normalized, then ρ = |ψ⟩⟨ψ|.
    Vector(Vec<Complex64>),
    /// Hermitian positive semi-definite matrix; normalized by its trace.
    Matrix(Array2<Complex64>),
}

/// A density matrix: Hermitian, positive semi-definite, unit trace.
///
/// Invariants are checked once when the value is built. Everything
/// downstream trusts the type.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    matrix: Array2<Complex64>,
}

impl DensityMatrix {
    /// Build from either a state vector or a Hermitian matrix.
    pub fn make(source: StateInput, tol: &Tolerances) -> Result<Self> {
        match source {
            StateInput::Vector(psi) => Self::from_state_vector(&psi, tol),
            StateInput::Matrix(m) => Self::from_hermitian(m, tol),
        }
    }

    /// ρ = |ψ⟩⟨ψ| / ⟨ψ|ψ⟩.
    pub fn from_state_vector(psi: &[Complex64], tol: &Tolerances) -> Result<Self> {
        if psi.is_empty() {
            return Err(Error::DimensionMismatch {
                operation: "state vector".into(),
                expected: 1,
                actual: 0,
            });
        }
        if psi.iter().any(|z| !z.re.is_finite() || !z.im.is_finite()) {
            return Err(Error::NumericalInstability(
                "state vector contains non-finite amplitudes".into(),
            ));
        }
        let norm = psi.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(DensityViolation::ZeroNorm.into());
        }
        let unit: Vec<Complex64> = psi.iter().map(|z| z / norm).collect();
        let matrix = outer(&unit, &unit);
        Self::validate(&matrix, tol)?;
        Ok(Self { matrix })
    }

    /// ρ = M / Tr M for a Hermitian positive semi-definite M.
    pub fn from_hermitian(m: Array2<Complex64>, tol: &Tolerances) -> Result<Self> {
        require_square(&m, "density matrix")?;
        if !is_finite(&m) {
            return Err(Error::NumericalInstability(
                "density matrix contains non-finite entries".into(),
            ));
        }
        if frobenius_norm(&m) == 0.0 {
            return Err(DensityViolation::ZeroNorm.into());
        }
        let tr = trace(&m).re;
        if tr <= 0.0 {
            return Err(DensityViolation::Trace { value: tr }.into());
        }
        // Tolerances apply to the normalized state
        let deviation = hermiticity_deviation(&m) / tr;
        if deviation > tol.hermiticity {
            return Err(DensityViolation::NotHermitian { deviation }.into());
        }
        let matrix = hermitian_part(&m) / Complex64::new(tr, 0.0);
        Self::validate(&matrix, tol)?;
        Ok(Self { matrix })
    }

    /// Accept a matrix that must already have unit trace. No normalization.
    pub fn new(m: Array2<Complex64>, tol: &Tolerances) -> Result<Self> {
        require_square(&m, "density matrix")?;
        if !is_finite(&m) {
            return Err(Error::NumericalInstability(
                "density matrix contains non-finite entries".into(),
            ));
        }
        Self::validate(&m, tol)?;
        Ok(Self {
            matrix: hermitian_part(&m),
        })
    }

    /// Basis projector |k⟩⟨k| in dimension `dim`.
    pub fn from_basis_state(dim: usize, k: usize) -> Result<Self> {
        if k >= dim {
            return Err(Error::DimensionMismatch {
                operation: format!("basis state {k}"),
                expected: dim,
                actual: k + 1,
            });
        }
        let mut matrix = Array2::zeros((dim, dim));
        matrix[[k, k]] = Complex64::new(1.0, 0.0);
        Ok(Self { matrix })
    }

    /// I / d.
    pub fn maximally_mixed(dim: usize) -> Self {
        Self {
            matrix: Array2::from_diag_elem(dim, Complex64::new(1.0 / dim as f64, 0.0)),
        }
    }

    /// Wrap a matrix produced by an invariant-preserving operation
    /// (integration step after stabilization, partial trace, tensor product).
    pub(crate) fn from_trusted(matrix: Array2<Complex64>) -> Self {
        Self { matrix }
    }

    /// Check Hermiticity, unit trace and positivity, in that order.
    pub fn validate(m: &Array2<Complex64>, tol: &Tolerances) -> Result<()> {
        require_square(m, "density matrix")?;
        let deviation = hermiticity_deviation(m);
        if deviation > tol.hermiticity {
            return Err(DensityViolation::NotHermitian { deviation }.into());
        }
        let tr = trace(m).re;
        if (tr - 1.0).abs() > tol.trace {
            return Err(DensityViolation::Trace { value: tr }.into());
        }
        let values = eigvalsh(m, tol.hermiticity)?;
        if let Some(&min) = values.first() {
            if min < -tol.positivity {
                return Err(DensityViolation::NegativeEigenvalue { value: min }.into());
            }
        }
        Ok(())
    }

    /// Underlying matrix.
    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    /// Take ownership of the underlying matrix.
    pub fn into_matrix(self) -> Array2<Complex64> {
        self.matrix
    }

    /// Hilbert-space dimension.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Real part of the trace (1 up to rounding).
    pub fn trace(&self) -> f64 {
        trace(&self.matrix).re
    }

    /// Purity Tr(ρ²) = ‖ρ‖²_F for Hermitian ρ.
    pub fn purity(&self) -> f64 {
        self.matrix.iter().map(|z| z.norm_sqr()).sum()
    }

    /// Eigenvalues, ascending.
    pub fn eigenvalues(&self, tol: &Tolerances) -> Result<Vec<f64>> {
        eigvalsh(&self.matrix, tol.hermiticity)
    }

    /// ρ ⊗ σ.
    pub fn tensor(&self, other: &DensityMatrix) -> DensityMatrix {
        Self::from_trusted(kron(&self.matrix, &other.matrix))
    }
}
