// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Time grids, integrator settings and trajectories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::DensityMatrix;

/// Strictly increasing sequence of sample times t₀ < t₁ < … < t_{n−1}.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    /// `count` evenly spaced points from `start` to `stop` inclusive.
    pub fn linspace(start: f64, stop: f64, count: usize) -> Result<Self> {
        if !start.is_finite() || !stop.is_finite() {
            return Err(Error::InvalidTimeGrid(format!(
                "bounds must be finite, got [{start}, {stop}]"
            )));
        }
        match count {
            0 => Err(Error::InvalidTimeGrid("grid needs at least one point".into())),
            1 => Self::from_points(vec![start]),
            _ => {
                if stop <= start {
                    return Err(Error::InvalidTimeGrid(format!(
                        "stop ({stop}) must be greater than start ({start})"
                    )));
                }
                let step = (stop - start) / (count - 1) as f64;
                let mut points: Vec<f64> = (0..count).map(|k| start + k as f64 * step).collect();
                // Pin the endpoint against accumulated rounding.
                points[count - 1] = stop;
                Self::from_points(points)
            }
        }
    }

    /// Grid from explicit sample times.
    pub fn from_points(points: Vec<f64>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidTimeGrid("grid needs at least one point".into()));
        }
        if let Some(bad) = points.iter().find(|t| !t.is_finite()) {
            return Err(Error::InvalidTimeGrid(format!("non-finite time {bad}")));
        }
        if let Some(k) = points.windows(2).position(|w| w[1] <= w[0]) {
            return Err(Error::InvalidTimeGrid(format!(
                "times must be strictly increasing: t[{}] = {} ≥ t[{}] = {}",
                k,
                points[k],
                k + 1,
                points[k + 1]
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed grid.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// Interval widths Δt_i = t_{i+1} − t_i.
    pub fn intervals(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.windows(2).map(|w| w[1] - w[0])
    }
}

/// Fixed-step scheme used between grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    /// Classical 4th-order Runge–Kutta. Local error O(h⁵) per sub-step.
    #[default]
    Rk4,
    /// exp(𝓛Δt) on the vectorized state. Exact up to Padé(13) rounding.
    Exact,
}

impl FromStr for IntegrationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rk4" => Ok(IntegrationMethod::Rk4),
            "exact" => Ok(IntegrationMethod::Exact),
            other => Err(Error::Config(format!(
                "unknown integration method '{other}' (expected rk4 or exact)"
            ))),
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationMethod::Rk4 => write!(f, "rk4"),
            IntegrationMethod::Exact => write!(f, "exact"),
        }
    }
}

/// Integrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Integration scheme
    #[serde(default)]
    pub method: IntegrationMethod,

    /// Largest RK4 sub-step; each grid interval uses ⌈Δt / max_step⌉ sub-steps
    #[serde(default = "default_max_step")]
    pub max_step: f64,

    /// Run full density-matrix validation after every grid step
    #[serde(default)]
    pub verify_each_step: bool,

    /// Largest summary change accepted by the step-halving convergence check
    #[serde(default = "default_convergence_bound")]
    pub convergence_bound: f64,
}

fn default_max_step() -> f64 {
    0.01
}

fn default_convergence_bound() -> f64 {
    1e-6
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::default(),
            max_step: default_max_step(),
            verify_each_step: false,
            convergence_bound: default_convergence_bound(),
        }
    }
}

impl IntegratorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(Error::Config(format!(
                "integrator.max_step must be positive, got {}",
                self.max_step
            )));
        }
        if !(self.convergence_bound.is_finite() && self.convergence_bound > 0.0) {
            return Err(Error::Config(format!(
                "integrator.convergence_bound must be positive, got {}",
                self.convergence_bound
            )));
        }
        Ok(())
    }

    /// Same settings with the RK4 sub-step halved.
    pub fn refined(&self) -> Self {
        Self {
            max_step: self.max_step / 2.0,
            ..self.clone()
        }
    }
}

/// Ordered (time, state) pairs from one integration call.
#[derive(Debug, Clone)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<DensityMatrix>,
}

impl Trajectory {
    pub(crate) fn new(times: Vec<f64>, states: Vec<DensityMatrix>) -> Self {
        debug_assert_eq!(times.len(), states.len());
        Self { times, states }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[DensityMatrix] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(f64, &DensityMatrix)> {
        Some((*self.times.get(index)?, self.states.get(index)?))
    }

    pub fn final_state(&self) -> Option<&DensityMatrix> {
        self.states.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &DensityMatrix)> {
        self.times.iter().copied().zip(self.states.iter())
    }
}
