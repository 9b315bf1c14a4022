// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hermitian operators (Hamiltonians, observables) and collapse operators.

use ndarray::Array2;
use num_complex::Complex64;

use super::library::{lowering, number, pauli_z};
use crate::error::{Error, Result, ValidationError};
use crate::linalg::ops::{
    hermitian_part, hermiticity_deviation, identity, is_finite, require_square,
};
use crate::tolerance::Tolerances;

/// An operator with M = M† (within tolerance at construction).
///
/// The stored matrix is the exact Hermitian part of the input, so
/// expectation values against valid states carry no spurious imaginary part.
#[derive(Debug, Clone, PartialEq)]
pub struct HermitianOperator {
    matrix: Array2<Complex64>,
    label: String,
}

impl HermitianOperator {
    /// Validate and wrap a Hermitian matrix.
    pub fn new(
        label: impl Into<String>,
        matrix: Array2<Complex64>,
        tol: &Tolerances,
    ) -> Result<Self> {
        let label = label.into();
        require_square(&matrix, &format!("operator '{label}'"))?;
        if !is_finite(&matrix) {
            return Err(Error::NumericalInstability(format!(
                "operator '{label}' contains non-finite entries"
            )));
        }
        let deviation = hermiticity_deviation(&matrix);
        if deviation > tol.hermiticity {
            return Err(Error::NotHermitian { label, deviation });
        }
        Ok(Self {
            matrix: hermitian_part(&matrix),
            label,
        })
    }

    /// d × d identity.
    pub fn identity(dim: usize) -> Self {
        Self {
            matrix: identity(dim),
            label: "identity".into(),
        }
    }

    /// d × d zero operator.
    pub fn zero(dim: usize) -> Self {
        Self {
            matrix: Array2::zeros((dim, dim)),
            label: "zero".into(),
        }
    }

    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// True when every entry is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.matrix.iter().all(|z| z.re == 0.0 && z.im == 0.0)
    }
}

/// A Lindblad collapse (jump) operator with its rate.
///
/// Represents a single dissipation channel:
///   D[L](ρ) = γ (L ρ L† − ½{L†L, ρ})
///
/// L need not be Hermitian. The rate γ must be finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseOperator {
    matrix: Array2<Complex64>,
    rate: f64,
    label: String,
}

impl CollapseOperator {
    /// Validate and wrap a dissipation channel.
    pub fn new(label: impl Into<String>, matrix: Array2<Complex64>, rate: f64) -> Result<Self> {
        let label = label.into();
        require_square(&matrix, &format!("collapse operator '{label}'"))?;
        if !is_finite(&matrix) {
            return Err(Error::NumericalInstability(format!(
                "collapse operator '{label}' contains non-finite entries"
            )));
        }
        if rate.is_nan() || rate.is_infinite() {
            return Err(ValidationError::Field {
                field: format!("rate of '{label}'"),
                message: format!("must be finite, got {rate}"),
            }
            .into());
        }
        if rate < 0.0 {
            return Err(Error::NegativeRate { label, rate });
        }
        Ok(Self {
            matrix,
            rate,
            label,
        })
    }

    /// Energy relaxation through the truncated annihilation operator a.
    pub fn amplitude_damping(dim: usize, rate: f64, label: impl Into<String>) -> Result<Self> {
        Self::new(label, lowering(dim), rate)
    }

    /// Dephasing in the number basis, L = n̂.
    pub fn dephasing(dim: usize, rate: f64, label: impl Into<String>) -> Result<Self> {
        Self::new(label, number(dim), rate)
    }

    /// Qubit T1 relaxation and pure dephasing, in grid time units.
    ///
    /// Relaxation: L = σ⁻ with γ₁ = 1/T1.
    /// Dephasing:  L = σz with γ = γ_φ/2, where γ_φ = 1/T2 − 1/(2·T1),
    /// so coherences decay as exp(−t/T2).
    pub fn from_t1_t2(t1: f64, t2: f64, qubit_label: &str) -> Result<Vec<Self>> {
        if t1 <= 0.0 || !t1.is_finite() {
            return Err(ValidationError::Field {
                field: "t1".into(),
                message: format!("must be positive, got {t1}"),
            }
            .into());
        }
        if t2 <= 0.0 || !t2.is_finite() {
            return Err(ValidationError::Field {
                field: "t2".into(),
                message: format!("must be positive, got {t2}"),
            }
            .into());
        }
        if t2 > 2.0 * t1 {
            return Err(ValidationError::Field {
                field: "t2".into(),
                message: format!("T2 ({t2}) must be ≤ 2*T1 ({})", 2.0 * t1),
            }
            .into());
        }
        let gamma_phi = (1.0 / t2 - 1.0 / (2.0 * t1)).max(0.0);
        Ok(vec![
            Self::new(format!("T1_{qubit_label}"), lowering(2), 1.0 / t1)?,
            Self::new(format!("Tphi_{qubit_label}"), pauli_z(), gamma_phi / 2.0)?,
        ])
    }

    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }
}
