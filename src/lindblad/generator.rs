// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lindblad generator in closure form.
//!
//! Evaluates dρ/dt = -i[H, ρ] + Σ_k γ_k (L_k ρ L_k† − ½{L_k†L_k, ρ}).
//!
//! The anticommutator terms are folded into a non-Hermitian effective
//! Hamiltonian H_eff = H − (i/2) Σ_k γ_k L_k†L_k, so that
//!
//!   dρ/dt = -i (H_eff ρ − ρ H_eff†) + Σ_k γ_k L_k ρ L_k†
//!
//! Ref: Breuer & Petruccione, "The Theory of Open Quantum Systems" (2002), Ch. 3.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::linalg::ops::{dagger, require_dim};
use crate::state::{CollapseOperator, HermitianOperator};

/// A collapse operator with its adjoint products precomputed.
#[derive(Debug, Clone)]
struct Channel {
    op: CollapseOperator,
    l_dag: Array2<Complex64>,
    l_dag_l: Array2<Complex64>,
}

/// The generator 𝓛 of one master equation.
///
/// Immutable after construction. Shared read-only by every integration
/// that uses it.
#[derive(Debug, Clone)]
pub struct LindbladGenerator {
    hamiltonian: HermitianOperator,
    channels: Vec<Channel>,
    h_eff: Array2<Complex64>,
    h_eff_dag: Array2<Complex64>,
}

impl LindbladGenerator {
    /// Build a generator from H and an ordered set of dissipation channels.
    ///
    /// Fails with `NegativeRate` for γ_k < 0 and `DimensionMismatch` when
    /// any L_k does not match the dimension of H.
    pub fn new(hamiltonian: HermitianOperator, collapse_ops: Vec<CollapseOperator>) -> Result<Self> {
        let dim = hamiltonian.dim();
        let mut channels = Vec::with_capacity(collapse_ops.len());
        let mut h_eff = hamiltonian.matrix().clone();

        for op in collapse_ops {
            if op.rate() < 0.0 {
                return Err(Error::NegativeRate {
                    label: op.label().to_string(),
                    rate: op.rate(),
                });
            }
            require_dim(op.matrix(), dim, &format!("collapse operator '{}'", op.label()))?;

            let l_dag = dagger(op.matrix());
            let l_dag_l = l_dag.dot(op.matrix());
            h_eff = h_eff - &l_dag_l * Complex64::new(0.0, 0.5 * op.rate());
            channels.push(Channel {
                op,
                l_dag,
                l_dag_l,
            });
        }

        Ok(Self {
            hamiltonian,
            channels,
            h_eff_dag: dagger(&h_eff),
            h_eff,
        })
    }

    /// Closed-system generator: -i[H, ρ].
    pub fn unitary(hamiltonian: HermitianOperator) -> Self {
        Self {
            h_eff: hamiltonian.matrix().clone(),
            h_eff_dag: hamiltonian.matrix().clone(),
            hamiltonian,
            channels: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.hamiltonian.dim()
    }

    pub fn hamiltonian(&self) -> &HermitianOperator {
        &self.hamiltonian
    }

    /// Collapse operators in insertion order.
    pub fn collapse_ops(&self) -> impl Iterator<Item = &CollapseOperator> {
        self.channels.iter().map(|c| &c.op)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// True when H = 0 and every channel has zero rate, so dρ/dt ≡ 0.
    pub fn is_trivial(&self) -> bool {
        self.hamiltonian.is_zero() && self.channels.iter().all(|c| c.op.rate() == 0.0)
    }

    /// dρ/dt for a matrix of the generator's dimension.
    pub fn rhs(&self, rho: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        require_dim(rho, self.dim(), "lindblad rhs")?;
        Ok(self.evaluate(rho))
    }

    /// Σ_k D[L_k](ρ) alone.
    pub fn dissipator(&self, rho: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        require_dim(rho, self.dim(), "lindblad dissipator")?;
        let mut total = Array2::zeros(rho.raw_dim());
        for channel in &self.channels {
            let gamma = channel.op.rate();
            if gamma == 0.0 {
                continue;
            }
            let l = channel.op.matrix();
            let jump = l.dot(rho).dot(&channel.l_dag);
            let anti = channel.l_dag_l.dot(rho) + rho.dot(&channel.l_dag_l);
            total = total + (jump - anti * Complex64::new(0.5, 0.0)) * Complex64::new(gamma, 0.0);
        }
        Ok(total)
    }

    /// dρ/dt without a dimension check. Callers guarantee `rho` is d × d.
    pub(crate) fn evaluate(&self, rho: &Array2<Complex64>) -> Array2<Complex64> {
        let minus_i = Complex64::new(0.0, -1.0);
        let h_rho = self.h_eff.dot(rho);
        // Stage inputs of an RK step need not be exactly Hermitian, so
        // ρ H_eff† is formed directly rather than as (H_eff ρ)†.
        let rho_h = rho.dot(&self.h_eff_dag);
        let mut out = (h_rho - rho_h) * minus_i;
        for channel in &self.channels {
            let gamma = channel.op.rate();
            if gamma == 0.0 {
                continue;
            }
            let jump = channel.op.matrix().dot(rho).dot(&channel.l_dag);
            out = out + jump * Complex64::new(gamma, 0.0);
        }
        out
    }

    /// Channel data for the explicit superoperator.
    pub(crate) fn channel_terms(
        &self,
    ) -> impl Iterator<Item = (f64, &Array2<Complex64>, &Array2<Complex64>)> {
        self.channels
            .iter()
            .map(|c| (c.op.rate(), c.op.matrix(), &c.l_dag_l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::ops::{commutator, trace};
    use crate::state::library::{lowering, pauli_z};
    use crate::test_utils::{assert_matrix_close, c, random_hermitian};
    use crate::tolerance::Tolerances;
    use approx::assert_relative_eq;

    fn excited_state() -> Array2<Complex64> {
        let mut m = Array2::zeros((2, 2));
        m[[1, 1]] = c(1.0);
        m
    }

    fn ground_state() -> Array2<Complex64> {
        let mut m = Array2::zeros((2, 2));
        m[[0, 0]] = c(1.0);
        m
    }

    fn plus_state() -> Array2<Complex64> {
        Array2::from_elem((2, 2), c(0.5))
    }

    fn decay(gamma: f64) -> LindbladGenerator {
        let op = CollapseOperator::new("T1", lowering(2), gamma).unwrap();
        LindbladGenerator::new(HermitianOperator::zero(2), vec![op]).unwrap()
    }

    #[test]
    fn test_ground_state_is_fixed_point() {
        let d = decay(3.0).rhs(&ground_state()).unwrap();
        for elem in d.iter() {
            assert_relative_eq!(elem.norm(), 0.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_excited_state_decays() {
        let gamma = 0.7;
        let d = decay(gamma).rhs(&excited_state()).unwrap();
        assert_relative_eq!(d[[0, 0]].re, gamma, epsilon = 1e-15);
        assert_relative_eq!(d[[1, 1]].re, -gamma, epsilon = 1e-15);
    }

    #[test]
    fn test_rhs_is_traceless() {
        let op = CollapseOperator::new("a", lowering(4), 0.3).unwrap();
        let h = HermitianOperator::new("h", random_hermitian(4, 7), &Tolerances::default()).unwrap();
        let gen = LindbladGenerator::new(h, vec![op]).unwrap();
        let rho = Array2::from_diag_elem(4, c(0.25));
        let tr = trace(&gen.rhs(&rho).unwrap());
        assert_relative_eq!(tr.norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_dephasing_kills_coherences() {
        let gamma = 0.4;
        let op = CollapseOperator::new("Tphi", pauli_z(), gamma).unwrap();
        let gen = LindbladGenerator::new(HermitianOperator::zero(2), vec![op]).unwrap();
        let d = gen.dissipator(&plus_state()).unwrap();

        assert_relative_eq!(d[[0, 0]].re, 0.0, epsilon = 1e-15);
        assert_relative_eq!(d[[1, 1]].re, 0.0, epsilon = 1e-15);
        // D[σz](ρ)_01 = -2γ ρ_01
        assert_relative_eq!(d[[0, 1]].re, -2.0 * gamma * 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_effective_hamiltonian_matches_explicit_form() {
        let tol = Tolerances::default();
        let h = HermitianOperator::new("h", random_hermitian(3, 11), &tol).unwrap();
        let ops = vec![
            CollapseOperator::new("a", lowering(3), 0.5).unwrap(),
            CollapseOperator::new("b", random_hermitian(3, 12), 0.1).unwrap(),
        ];
        let gen = LindbladGenerator::new(h.clone(), ops).unwrap();
        let rho = random_hermitian(3, 13);

        let unitary = commutator(h.matrix(), &rho).unwrap() * Complex64::new(0.0, -1.0);
        let explicit = unitary + gen.dissipator(&rho).unwrap();
        assert_matrix_close(&gen.rhs(&rho).unwrap(), &explicit, 1e-13);
    }

    #[test]
    fn test_unitary_generator_commuting_state() {
        let h = HermitianOperator::new("z", pauli_z(), &Tolerances::default()).unwrap();
        let gen = LindbladGenerator::unitary(h);
        let d = gen.rhs(&excited_state()).unwrap();
        for elem in d.iter() {
            assert_relative_eq!(elem.norm(), 0.0, epsilon = 1e-15);
        }
        assert!(!gen.is_trivial());
    }

    #[test]
    fn test_trivial_generator() {
        assert!(decay(0.0).is_trivial());
        assert!(!decay(0.1).is_trivial());
        assert!(LindbladGenerator::unitary(HermitianOperator::zero(3)).is_trivial());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let op = CollapseOperator::new("a", lowering(3), 0.1).unwrap();
        let err = LindbladGenerator::new(HermitianOperator::zero(2), vec![op]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3, .. }));

        let gen = decay(0.1);
        assert!(gen.rhs(&Array2::zeros((3, 3))).is_err());
    }
}
