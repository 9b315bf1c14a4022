// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios through the public API.

use approx::assert_relative_eq;
use num_complex::Complex64;

use qubit_os_dynamics::aggregate::{AggregationConfig, Aggregator, Labeled, Measure, Reducer};
use qubit_os_dynamics::lindblad::{
    IntegrationMethod, Integrator, IntegratorConfig, LindbladGenerator, TimeGrid,
};
use qubit_os_dynamics::observables::{expectation, von_neumann_entropy};
use qubit_os_dynamics::projection::Projector;
use qubit_os_dynamics::source::{OperatorSource, RandomSource};
use qubit_os_dynamics::state::library::{number, projector};
use qubit_os_dynamics::state::{CollapseOperator, DensityMatrix, HermitianOperator};
use qubit_os_dynamics::tolerance::Tolerances;
use qubit_os_dynamics::scenario::Scenario;
use qubit_os_dynamics::{Config, Error};

fn tol() -> Tolerances {
    Tolerances::default()
}

fn population(rho: &DensityMatrix, k: usize) -> f64 {
    rho.matrix()[[k, k]].re
}

#[test]
fn ladder_decay_is_monotone_and_trace_preserving() {
    let decay = CollapseOperator::amplitude_damping(4, 0.2, "decay").unwrap();
    let generator = LindbladGenerator::new(HermitianOperator::zero(4), vec![decay]).unwrap();
    let initial = DensityMatrix::from_basis_state(4, 3).unwrap();
    let grid = TimeGrid::linspace(0.0, 20.0, 201).unwrap();

    for method in [IntegrationMethod::Rk4, IntegrationMethod::Exact] {
        let integrator = Integrator::new(
            IntegratorConfig {
                method,
                ..IntegratorConfig::default()
            },
            tol(),
        );
        let trajectory = integrator.integrate(&generator, &initial, &grid).unwrap();
        assert_eq!(trajectory.len(), 201);

        let mut last_ground = -1.0;
        let mut last_top = 2.0;
        for (t, rho) in trajectory.iter() {
            assert_relative_eq!(rho.trace(), 1.0, epsilon = 1e-6);
            let ground = population(rho, 0);
            let top = population(rho, 3);
            assert!(ground >= last_ground - 1e-12, "ground population fell at t = {t}");
            assert!(top <= last_top + 1e-12, "excited population rose at t = {t}");
            // |3⟩ leaves at rate 3γ
            assert_relative_eq!(top, (-0.6 * t).exp(), epsilon = 1e-8);
            last_ground = ground;
            last_top = top;
        }
        let last = trajectory.final_state().unwrap();
        assert!(population(last, 0) > 0.9);
    }
}

#[test]
fn product_state_projects_to_first_factor() {
    let a_vec = [Complex64::new(0.6, 0.0), Complex64::new(0.0, 0.8)];
    let a = DensityMatrix::from_state_vector(&a_vec, &tol()).unwrap();
    let keep_first = Projector::new(vec![2, 2], vec![0]).unwrap();

    let mut source = RandomSource::seeded(42).with_pure_states(true);
    for _ in 0..5 {
        let b = source.density_matrix(2, &tol()).unwrap();
        let reduced = keep_first.project(&a.tensor(&b)).unwrap();
        for (x, y) in reduced.matrix().iter().zip(a.matrix().iter()) {
            assert!((x - y).norm() < 1e-12);
        }
        assert_relative_eq!(reduced.purity(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn independent_states_give_independent_summaries() {
    let decay = CollapseOperator::amplitude_damping(3, 0.3, "decay").unwrap();
    let generator = LindbladGenerator::new(HermitianOperator::zero(3), vec![decay]).unwrap();
    let n = HermitianOperator::new("n", number(3), &tol()).unwrap();
    let measures = Labeled::from_pairs([("n", Measure::Expectation(n))]).unwrap();
    let grid = TimeGrid::linspace(0.0, 4.0, 41).unwrap();
    let aggregator = Aggregator::new(
        generator,
        Integrator::default(),
        Projector::identity(3),
        AggregationConfig {
            keep_series: true,
            ..AggregationConfig::default()
        },
    )
    .unwrap();

    let mut states = Labeled::from_pairs([
        ("top", DensityMatrix::from_basis_state(3, 2).unwrap()),
        ("middle", DensityMatrix::from_basis_state(3, 1).unwrap()),
    ])
    .unwrap();
    let both = aggregator.run(&states, &measures, &grid).unwrap();

    let alone = |label: &str, state: DensityMatrix| {
        let single = Labeled::from_pairs([(label, state)]).unwrap();
        aggregator.run(&single, &measures, &grid).unwrap()
    };
    let top = alone("top", DensityMatrix::from_basis_state(3, 2).unwrap());
    let middle = alone("middle", DensityMatrix::from_basis_state(3, 1).unwrap());

    assert_eq!(both.get("top", "n"), top.get("top", "n"));
    assert_eq!(both.get("middle", "n"), middle.get("middle", "n"));
    assert!(both.get("top", "n").unwrap() > both.get("middle", "n").unwrap());
    assert_eq!(both.series("top", "n").unwrap(), top.series("top", "n").unwrap());

    // Later changes to the inputs leave the computed table alone
    let before = both.values().clone();
    states.push("ground", DensityMatrix::from_basis_state(3, 0).unwrap()).unwrap();
    let _ = aggregator.run(&states, &measures, &grid).unwrap();
    assert_eq!(both.values(), &before);
    assert_eq!(both.state_labels(), &["top".to_string(), "middle".to_string()]);
}

#[test]
fn edited_copies_leave_trajectories_alone() {
    let decay = CollapseOperator::amplitude_damping(3, 0.3, "decay").unwrap();
    let generator = LindbladGenerator::new(HermitianOperator::zero(3), vec![decay]).unwrap();
    let n = HermitianOperator::new("n", number(3), &tol()).unwrap();
    let grid = TimeGrid::linspace(0.0, 2.0, 21).unwrap();
    let integrator = Integrator::default();
    let top = integrator
        .integrate(&generator, &DensityMatrix::from_basis_state(3, 2).unwrap(), &grid)
        .unwrap();
    let middle = integrator
        .integrate(&generator, &DensityMatrix::from_basis_state(3, 1).unwrap(), &grid)
        .unwrap();

    let occupation = |states: &[DensityMatrix]| -> Vec<f64> {
        states
            .iter()
            .map(|rho| expectation(&n, rho, &tol()).unwrap())
            .collect()
    };
    let top_before = occupation(top.states());
    let middle_before = occupation(middle.states());

    // Replace the midpoint of a copy with the ground state
    let copy = top.clone();
    let mut edited: Vec<DensityMatrix> = copy.states().to_vec();
    let mut m = edited[10].matrix().clone();
    m.fill(Complex64::new(0.0, 0.0));
    m[[0, 0]] = Complex64::new(1.0, 0.0);
    edited[10] = DensityMatrix::from_hermitian(m, &tol()).unwrap();
    assert_relative_eq!(occupation(&edited)[10], 0.0, epsilon = 1e-12);

    assert_eq!(occupation(top.states()), top_before);
    assert_eq!(occupation(copy.states()), top_before);
    assert_eq!(occupation(middle.states()), middle_before);
    assert!(top_before[10] > 0.5);
}

#[test]
fn zero_dynamics_leave_state_unchanged() {
    let mut source = RandomSource::seeded(9);
    let initial = source.density_matrix(5, &tol()).unwrap();
    let generator = LindbladGenerator::unitary(HermitianOperator::zero(5));
    let grid = TimeGrid::linspace(0.0, 3.0, 31).unwrap();

    for method in [IntegrationMethod::Rk4, IntegrationMethod::Exact] {
        let integrator = Integrator::new(
            IntegratorConfig {
                method,
                ..IntegratorConfig::default()
            },
            tol(),
        );
        let trajectory = integrator.integrate(&generator, &initial, &grid).unwrap();
        for (_, rho) in trajectory.iter() {
            for (x, y) in rho.matrix().iter().zip(initial.matrix().iter()) {
                assert!((x - y).norm() < 1e-12);
            }
        }
    }
}

#[test]
fn identity_expectation_and_pure_entropy() {
    let mut source = RandomSource::seeded(5);
    let identity = HermitianOperator::identity(4);
    for _ in 0..10 {
        let mixed = source.density_matrix(4, &tol()).unwrap();
        assert_relative_eq!(expectation(&identity, &mixed, &tol()).unwrap(), 1.0, epsilon = 1e-9);
    }

    let mut pure = RandomSource::seeded(5).with_pure_states(true);
    for _ in 0..10 {
        let rho = pure.density_matrix(4, &tol()).unwrap();
        assert!(von_neumann_entropy(&rho, &tol()).unwrap().abs() < 1e-9);
    }
}

#[test]
fn reducers_over_known_decay() {
    // p₁(t) = e^{−γt} for a qubit starting in |1⟩
    let gamma = 0.5;
    let decay = CollapseOperator::amplitude_damping(2, gamma, "decay").unwrap();
    let generator = LindbladGenerator::new(HermitianOperator::zero(2), vec![decay]).unwrap();
    let p1 = HermitianOperator::new("p1", projector(2, 1).unwrap(), &tol()).unwrap();
    let states = Labeled::from_pairs([("excited", DensityMatrix::from_basis_state(2, 1).unwrap())])
        .unwrap();
    let measures = Labeled::from_pairs([("p1", Measure::Expectation(p1))]).unwrap();
    let grid = TimeGrid::linspace(0.0, 4.0, 401).unwrap();

    let run = |reducer: Reducer| {
        let aggregator = Aggregator::new(
            generator.clone(),
            Integrator::default(),
            Projector::identity(2),
            AggregationConfig {
                reducer,
                ..AggregationConfig::default()
            },
        )
        .unwrap();
        aggregator
            .run(&states, &measures, &grid)
            .unwrap()
            .get("excited", "p1")
            .unwrap()
    };

    let exact_average = (1.0 - (-gamma * 4.0f64).exp()) / (gamma * 4.0);
    assert_relative_eq!(run(Reducer::TimeAverage), exact_average, epsilon = 1e-4);
    assert_relative_eq!(run(Reducer::Final), (-gamma * 4.0f64).exp(), epsilon = 1e-8);
    assert_relative_eq!(run(Reducer::Max), 1.0, epsilon = 1e-12);
    assert_relative_eq!(run(Reducer::Min), (-gamma * 4.0f64).exp(), epsilon = 1e-8);
}

#[test]
fn mismatched_inputs_are_rejected() {
    let generator = LindbladGenerator::unitary(HermitianOperator::zero(4));
    let integrator = Integrator::default();
    let grid = TimeGrid::linspace(0.0, 1.0, 3).unwrap();

    let wrong = DensityMatrix::maximally_mixed(2);
    assert!(matches!(
        integrator.integrate(&generator, &wrong, &grid),
        Err(Error::DimensionMismatch { .. })
    ));

    assert!(matches!(
        Aggregator::new(
            generator,
            integrator,
            Projector::new(vec![2, 3], vec![0]).unwrap(),
            AggregationConfig::default(),
        ),
        Err(Error::InvalidSubsystemSelection(_))
    ));
}

#[test]
fn demo_scenario_runs_and_converges() {
    let problem = Scenario::demo().build(&Config::default()).unwrap();
    let (table, report) = problem.run_with_convergence().unwrap();
    assert!(report.converged, "{report:?}");

    assert_eq!(table.state_labels().len(), 3);
    for state in table.state_labels() {
        let purity = table.get(state, "purity").unwrap();
        assert!(purity > 0.5 - 1e-9 && purity <= 1.0 + 1e-9);
        assert!(table.get(state, "entropy").unwrap() >= -1e-9);
        assert!(table.get(state, "sigma_z").unwrap().abs() <= 1.0 + 1e-9);
    }
    assert!(table.get("ground", "purity").unwrap() > table.get("mixed", "purity").unwrap());
}
