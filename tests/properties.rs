// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Invariants swept over random generators, states and grids.

use proptest::prelude::*;

use qubit_os_dynamics::linalg::ops::hermiticity_deviation;
use qubit_os_dynamics::linalg::partial_trace;
use qubit_os_dynamics::lindblad::{
    IntegrationMethod, Integrator, IntegratorConfig, LindbladGenerator, TimeGrid,
};
use qubit_os_dynamics::source::{OperatorSource, RandomSource};
use qubit_os_dynamics::state::DensityMatrix;
use qubit_os_dynamics::tolerance::Tolerances;

const EPS: f64 = 1e-7;

fn assert_density_invariants(rho: &DensityMatrix) {
    let tol = Tolerances::default();
    assert!((rho.trace() - 1.0).abs() < EPS, "trace {}", rho.trace());
    assert!(hermiticity_deviation(rho.matrix()) < EPS);
    let min = rho
        .eigenvalues(&tol)
        .unwrap()
        .into_iter()
        .fold(f64::INFINITY, f64::min);
    assert!(min > -EPS, "eigenvalue {min}");
}

fn random_generator(seed: u64, dim: usize, channels: usize) -> LindbladGenerator {
    let tol = Tolerances::default();
    let mut source = RandomSource::seeded(seed);
    let hamiltonian = source.hermitian(dim, "h", &tol).unwrap();
    let collapse = (0..channels)
        .map(|k| {
            let rate = 0.05 + 0.1 * k as f64;
            source.collapse_operator(dim, rate, &format!("c{k}")).unwrap()
        })
        .collect();
    LindbladGenerator::new(hamiltonian, collapse).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn made_states_are_valid(seed in any::<u64>(), dim in 1usize..7, pure in any::<bool>()) {
        let rho = RandomSource::seeded(seed)
            .with_pure_states(pure)
            .density_matrix(dim, &Tolerances::default())
            .unwrap();
        assert_density_invariants(&rho);
    }

    #[test]
    fn partial_trace_preserves_trace(seed in any::<u64>(), keep_first in any::<bool>()) {
        let rho = RandomSource::seeded(seed)
            .density_matrix(6, &Tolerances::default())
            .unwrap();
        let keep = if keep_first { vec![0] } else { vec![1] };
        let reduced = partial_trace(rho.matrix(), &[2, 3], &keep).unwrap();
        let tr: f64 = (0..reduced.nrows()).map(|i| reduced[[i, i]].re).sum();
        prop_assert!((tr - rho.trace()).abs() < 1e-12);
    }

    #[test]
    fn rk4_preserves_invariants(
        seed in any::<u64>(),
        dim in 2usize..5,
        channels in 0usize..3,
        points in 2usize..40,
    ) {
        let generator = random_generator(seed, dim, channels);
        let initial = RandomSource::seeded(seed.wrapping_add(1))
            .density_matrix(dim, &Tolerances::default())
            .unwrap();
        let grid = TimeGrid::linspace(0.0, 2.0, points).unwrap();
        let trajectory = Integrator::default()
            .integrate(&generator, &initial, &grid)
            .unwrap();

        prop_assert_eq!(trajectory.len(), points);
        for (_, rho) in trajectory.iter() {
            assert_density_invariants(rho);
        }
    }

    #[test]
    fn exact_propagation_matches_rk4(seed in any::<u64>(), dim in 2usize..4, points in 2usize..12) {
        let generator = random_generator(seed, dim, 2);
        let initial = RandomSource::seeded(seed ^ 0x5eed)
            .with_pure_states(true)
            .density_matrix(dim, &Tolerances::default())
            .unwrap();
        let grid = TimeGrid::linspace(0.0, 1.0, points).unwrap();

        let exact = Integrator::new(
            IntegratorConfig { method: IntegrationMethod::Exact, ..IntegratorConfig::default() },
            Tolerances::default(),
        )
        .integrate(&generator, &initial, &grid)
        .unwrap();
        let rk4 = Integrator::default().integrate(&generator, &initial, &grid).unwrap();

        for ((_, a), (_, b)) in exact.iter().zip(rk4.iter()) {
            assert_density_invariants(a);
            let diff = a
                .matrix()
                .iter()
                .zip(b.matrix().iter())
                .map(|(x, y)| (x - y).norm())
                .fold(0.0, f64::max);
            prop_assert!(diff < 1e-6, "max |Δ| = {}", diff);
        }
    }
}
