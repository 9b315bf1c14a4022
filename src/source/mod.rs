// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Injected sources of initial states and operators.
//!
//! The engine only depends on the invariants of the values it receives.
//! How a state or operator was produced is the business of an
//! [`OperatorSource`]; [`RandomSource`] is the seeded random implementation.

use ndarray::Array2;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::Result;
use crate::linalg::ops::{dagger, hermitian_part};
use crate::state::{CollapseOperator, DensityMatrix, HermitianOperator};
use crate::tolerance::Tolerances;

/// Producer of labelled operators and initial states.
pub trait OperatorSource: Send {
    /// Hermitian operator of dimension `dim`.
    fn hermitian(&mut self, dim: usize, label: &str, tol: &Tolerances) -> Result<HermitianOperator>;

    /// Density matrix of dimension `dim`.
    fn density_matrix(&mut self, dim: usize, tol: &Tolerances) -> Result<DensityMatrix>;

    /// Collapse operator of dimension `dim` with the given rate.
    fn collapse_operator(&mut self, dim: usize, rate: f64, label: &str) -> Result<CollapseOperator>;
}

/// Gaussian random matrices from a seeded generator.
///
/// - Hermitian operators: (G + G†)/2 for a complex Ginibre matrix G (GUE).
/// - Density matrices: G G† / Tr(G G†) (Hilbert–Schmidt measure), or a
///   normalized Gaussian vector for pure states.
/// - Collapse operators: G / √d.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    pure_states: bool,
}

impl RandomSource {
    /// Reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            pure_states: false,
        }
    }

    /// Source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            pure_states: false,
        }
    }

    /// Produce rank-one density matrices instead of mixed ones.
    pub fn with_pure_states(mut self, pure: bool) -> Self {
        self.pure_states = pure;
        self
    }

    fn gaussian(&mut self) -> Complex64 {
        let re: f64 = StandardNormal.sample(&mut self.rng);
        let im: f64 = StandardNormal.sample(&mut self.rng);
        Complex64::new(re, im) * std::f64::consts::FRAC_1_SQRT_2
    }

    /// d × d matrix of i.i.d. standard complex Gaussians.
    pub fn ginibre(&mut self, dim: usize) -> Array2<Complex64> {
        Array2::from_shape_simple_fn((dim, dim), || self.gaussian())
    }

    /// Normalized Gaussian state vector (Haar-distributed pure state).
    pub fn state_vector(&mut self, dim: usize) -> Vec<Complex64> {
        let v: Vec<Complex64> = (0..dim).map(|_| self.gaussian()).collect();
        let norm = v.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
        v.into_iter().map(|z| z / norm).collect()
    }
}

impl OperatorSource for RandomSource {
    fn hermitian(&mut self, dim: usize, label: &str, tol: &Tolerances) -> Result<HermitianOperator> {
        let g = self.ginibre(dim);
        HermitianOperator::new(label, hermitian_part(&g), tol)
    }

    fn density_matrix(&mut self, dim: usize, tol: &Tolerances) -> Result<DensityMatrix> {
        if self.pure_states {
            let psi = self.state_vector(dim);
            return DensityMatrix::from_state_vector(&psi, tol);
        }
        let g = self.ginibre(dim);
        DensityMatrix::from_hermitian(hermitian_part(&g.dot(&dagger(&g))), tol)
    }

    fn collapse_operator(&mut self, dim: usize, rate: f64, label: &str) -> Result<CollapseOperator> {
        let g = self.ginibre(dim) / Complex64::new((dim as f64).sqrt(), 0.0);
        CollapseOperator::new(label, g, rate)
    }
}
