// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-step integrator for the Lindblad master equation.
//!
//! Advances ρ across a strictly increasing time grid under a
//! time-independent generator. Each grid interval Δt is covered either by
//! ⌈Δt / max_step⌉ classical RK4 sub-steps or by the exact propagator
//! exp(𝓛Δt). After every grid step the state is re-Hermitized,
//! (M + M†)/2, and renormalized to unit trace.
//!
//! Ref: Press et al., "Numerical Recipes" (2007), §17.1.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use tracing::debug;

use super::generator::LindbladGenerator;
use super::superop::{Liouvillian, Propagator};
use super::types::{IntegrationMethod, IntegratorConfig, TimeGrid, Trajectory};
use crate::error::{Error, Result};
use crate::linalg::ops::{hermitian_part, is_finite, trace};
use crate::state::DensityMatrix;
use crate::tolerance::Tolerances;

/// Cooperative cancellation flag, checked between grid steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Master-equation integrator.
///
/// Holds only settings. The generator is borrowed per call, so one
/// generator can drive any number of concurrent integrations.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    config: IntegratorConfig,
    tolerances: Tolerances,
    cancel: Option<CancellationToken>,
}

impl Integrator {
    pub fn new(config: IntegratorConfig, tolerances: Tolerances) -> Self {
        Self {
            config,
            tolerances,
            cancel: None,
        }
    }

    /// Stop with `Cancelled` once `token` is set.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Same integrator with the RK4 sub-step halved.
    pub fn refined(&self) -> Self {
        Self {
            config: self.config.refined(),
            ..self.clone()
        }
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Evolve `initial` across `grid`. The first trajectory point is `initial` at t₀.
    pub fn integrate(
        &self,
        generator: &LindbladGenerator,
        initial: &DensityMatrix,
        grid: &TimeGrid,
    ) -> Result<Trajectory> {
        self.config.validate()?;
        if initial.dim() != generator.dim() {
            return Err(Error::DimensionMismatch {
                operation: "integrate initial state".into(),
                expected: generator.dim(),
                actual: initial.dim(),
            });
        }

        debug!(
            dim = generator.dim(),
            grid_points = grid.len(),
            channels = generator.num_channels(),
            method = %self.config.method,
            max_step = self.config.max_step,
            "Integrating master equation"
        );

        let mut states = Vec::with_capacity(grid.len());
        states.push(initial.clone());

        if generator.is_trivial() {
            for step in 0..grid.len().saturating_sub(1) {
                self.check_cancelled(step)?;
                states.push(initial.clone());
            }
            return Ok(Trajectory::new(grid.points().to_vec(), states));
        }

        let mut stepper = Stepper::new(generator, &self.config);
        let mut rho = initial.matrix().clone();
        let mut sub_steps = 0usize;

        for (step, dt) in grid.intervals().enumerate() {
            self.check_cancelled(step)?;
            let (next, n) = stepper.advance(&rho, dt)?;
            sub_steps += n;
            let t = grid.points()[step + 1];
            rho = self.stabilize(next, t)?;
            states.push(DensityMatrix::from_trusted(rho.clone()));
        }

        debug!(sub_steps, "Integration finished");
        Ok(Trajectory::new(grid.points().to_vec(), states))
    }

    fn check_cancelled(&self, completed_steps: usize) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled { completed_steps }),
            _ => Ok(()),
        }
    }

    /// Hermitian part, renormalized to unit trace.
    fn stabilize(&self, m: Array2<Complex64>, t: f64) -> Result<Array2<Complex64>> {
        if !is_finite(&m) {
            return Err(Error::NumericalInstability(format!(
                "non-finite density matrix at t = {t}"
            )));
        }
        let herm = hermitian_part(&m);
        let tr = trace(&herm).re;
        if !tr.is_finite() || tr <= 0.0 {
            return Err(Error::NumericalInstability(format!(
                "trace collapsed to {tr} at t = {t}"
            )));
        }
        let rho = herm / Complex64::new(tr, 0.0);
        if self.config.verify_each_step {
            DensityMatrix::validate(&rho, &self.tolerances).map_err(|e| {
                Error::NumericalInstability(format!("state at t = {t} is invalid: {e}"))
            })?;
        }
        Ok(rho)
    }
}

/// Per-call stepping state. Owns the propagator cache for the exact method.
enum Stepper<'a> {
    Rk4 {
        generator: &'a LindbladGenerator,
        max_step: f64,
    },
    Exact {
        liouvillian: Liouvillian,
        cached: Option<Propagator>,
    },
}

impl<'a> Stepper<'a> {
    fn new(generator: &'a LindbladGenerator, config: &IntegratorConfig) -> Self {
        match config.method {
            IntegrationMethod::Rk4 => Stepper::Rk4 {
                generator,
                max_step: config.max_step,
            },
            IntegrationMethod::Exact => Stepper::Exact {
                liouvillian: Liouvillian::from_generator(generator),
                cached: None,
            },
        }
    }

    /// Advance over one grid interval. Returns the new matrix and the sub-step count.
    fn advance(&mut self, rho: &Array2<Complex64>, dt: f64) -> Result<(Array2<Complex64>, usize)> {
        match self {
            Stepper::Rk4 {
                generator,
                max_step,
            } => {
                let n = (dt / *max_step).ceil().max(1.0) as usize;
                let h = dt / n as f64;
                let mut out = rho.clone();
                for _ in 0..n {
                    out = rk4_step(*generator, &out, h);
                }
                Ok((out, n))
            }
            Stepper::Exact {
                liouvillian,
                cached,
            } => {
                // Evenly spaced grids differ only by rounding between intervals.
                let propagator = match cached.take() {
                    Some(p) if (p.dt() - dt).abs() <= 1e-12 * dt.abs().max(1.0) => p,
                    _ => liouvillian.propagator(dt)?,
                };
                let out = propagator.apply(rho)?;
                *cached = Some(propagator);
                Ok((out, 1))
            }
        }
    }
}

/// Single classical RK4 step of width `h`.
fn rk4_step(generator: &LindbladGenerator, rho: &Array2<Complex64>, h: f64) -> Array2<Complex64> {
    let h_c = Complex64::new(h, 0.0);
    let half = Complex64::new(0.5, 0.0);
    let sixth = Complex64::new(1.0 / 6.0, 0.0);
    let two = Complex64::new(2.0, 0.0);

    let k1 = generator.evaluate(rho);
    let rho2 = rho + &(&k1 * (half * h_c));
    let k2 = generator.evaluate(&rho2);
    let rho3 = rho + &(&k2 * (half * h_c));
    let k3 = generator.evaluate(&rho3);
    let rho4 = rho + &(&k3 * h_c);
    let k4 = generator.evaluate(&rho4);

    rho + &((k1 + k2 * two + k3 * two + k4) * (sixth * h_c))
}
