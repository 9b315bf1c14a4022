// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Numerical tolerances shared by validation and evaluation.

use serde::{Deserialize, Serialize};

/// Default ε for every check.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Tolerances for Hermiticity, positivity, trace and imaginary-residual checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Max allowed |M - M†| entry
    #[serde(default = "default_epsilon")]
    pub hermiticity: f64,

    /// Eigenvalues down to -positivity are accepted as zero
    #[serde(default = "default_epsilon")]
    pub positivity: f64,

    /// Max allowed |Tr ρ - 1|
    #[serde(default = "default_epsilon")]
    pub trace: f64,

    /// Max allowed imaginary part of an expectation value
    #[serde(default = "default_epsilon")]
    pub imaginary: f64,
}

impl Tolerances {
    /// Use the same ε for every check.
    pub fn uniform(epsilon: f64) -> Self {
        Self {
            hermiticity: epsilon,
            positivity: epsilon,
            trace: epsilon,
            imaginary: epsilon,
        }
    }

    /// Every tolerance must be finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.hermiticity, self.positivity, self.trace, self.imaginary]
            .iter()
            .all(|t| t.is_finite() && *t > 0.0)
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::uniform(DEFAULT_EPSILON)
    }
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}
