// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lindblad master equation for open quantum systems.
//!
//! Implements the Gorini–Kossakowski–Sudarshan–Lindblad (GKSL) master equation:
//!
//!   dρ/dt = -i[H, ρ] + Σ_k γ_k (L_k ρ L_k† − ½{L_k†L_k, ρ})
//!
//! This module provides:
//! - [`LindbladGenerator`]: the right-hand side in closure form
//! - [`Liouvillian`]: the same generator as an explicit N² × N² matrix
//! - [`Integrator`]: RK4 or exact propagation over a [`TimeGrid`]
//!
//! # Example
//!
//! ```
//! use qubit_os_dynamics::lindblad::{Integrator, LindbladGenerator, TimeGrid};
//! use qubit_os_dynamics::state::{CollapseOperator, DensityMatrix, HermitianOperator};
//!
//! let decay = CollapseOperator::amplitude_damping(2, 0.5, "T1").unwrap();
//! let generator = LindbladGenerator::new(HermitianOperator::zero(2), vec![decay]).unwrap();
//! let grid = TimeGrid::linspace(0.0, 4.0, 41).unwrap();
//!
//! let excited = DensityMatrix::from_basis_state(2, 1).unwrap();
//! let trajectory = Integrator::default()
//!     .integrate(&generator, &excited, &grid)
//!     .unwrap();
//! let p1 = trajectory.final_state().unwrap().matrix()[[1, 1]].re;
//! assert!((p1 - (-2.0f64).exp()).abs() < 1e-8);
//! ```
//!
//! # References
//!
//! - Lindblad, G. (1976). Commun. Math. Phys. 48, 119.
//!   DOI: 10.1007/BF01608499
//! - Gorini, V., Kossakowski, A., & Sudarshan, E. C. G. (1976). J. Math. Phys. 17, 821.
//!   DOI: 10.1063/1.522979
//! - Breuer, H.-P. & Petruccione, F. (2002). "The Theory of Open Quantum Systems." Oxford.

pub mod generator;
pub mod integrate;
pub mod superop;
pub mod types;

pub use generator::LindbladGenerator;
pub use integrate::{CancellationToken, Integrator};
pub use superop::{Liouvillian, Propagator};
pub use types::{IntegrationMethod, IntegratorConfig, TimeGrid, Trajectory};
