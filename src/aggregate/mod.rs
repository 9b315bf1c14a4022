// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trajectory aggregation.
//!
//! Fans a shared generator out over labelled initial states, projects every
//! trajectory point onto the declared subsystem, evaluates each measure and
//! reduces every (state, measure) series to one summary scalar.
//!
//! Trajectories are independent, so they run in parallel on the rayon pool
//! when `parallel` is set. Each worker owns its own state buffers; only the
//! generator, projector and measures are shared, read-only. Output order
//! always follows the caller's label order.

pub mod convergence;
pub mod table;

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result, ValidationError};
use crate::lindblad::{Integrator, LindbladGenerator, TimeGrid, Trajectory};
use crate::observables::{expectation, purity, von_neumann_entropy};
use crate::projection::Projector;
use crate::state::{DensityMatrix, HermitianOperator};
use crate::tolerance::Tolerances;

pub use convergence::ConvergenceReport;
pub use table::{ObservationResult, SummaryTable, TimeTag};

/// Ordered collection with unique labels.
#[derive(Debug, Clone)]
pub struct Labeled<T> {
    items: Vec<(String, T)>,
}

impl<T> Default for Labeled<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Labeled<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item. Fails if `label` is already present.
    pub fn push(&mut self, label: impl Into<String>, item: T) -> Result<()> {
        let label = label.into();
        if self.items.iter().any(|(l, _)| *l == label) {
            return Err(ValidationError::Field {
                field: label,
                message: "duplicate label".into(),
            }
            .into());
        }
        self.items.push((label, item));
        Ok(())
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, T)>) -> Result<Self> {
        let mut out = Self::new();
        for (label, item) in pairs {
            out.push(label, item)?;
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&T> {
        self.items.iter().find(|(l, _)| l == label).map(|(_, t)| t)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(l, t)| (l.as_str(), t))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, t)| t)
    }
}

/// Scalar evaluated on every projected state.
#[derive(Debug, Clone)]
pub enum Measure {
    /// Tr[A ρ]
    Expectation(HermitianOperator),
    /// −Tr[ρ ln ρ]
    Entropy,
    /// Tr[ρ²]
    Purity,
}

impl Measure {
    pub fn evaluate(&self, state: &DensityMatrix, tol: &Tolerances) -> Result<f64> {
        match self {
            Measure::Expectation(op) => expectation(op, state, tol),
            Measure::Entropy => von_neumann_entropy(state, tol),
            Measure::Purity => Ok(purity(state)),
        }
    }

    /// Required state dimension, if the measure has one.
    fn dim(&self) -> Option<usize> {
        match self {
            Measure::Expectation(op) => Some(op.dim()),
            Measure::Entropy | Measure::Purity => None,
        }
    }
}

/// Reduction of a time series to one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Arithmetic mean over grid points
    #[default]
    Mean,
    /// Trapezoidal time average over [t₀, t_{n−1}]
    TimeAverage,
    /// Value at the last grid point
    Final,
    Min,
    Max,
}

impl Reducer {
    /// Reduce `values` sampled at `times`. Both slices have equal, non-zero length.
    pub fn reduce(&self, times: &[f64], values: &[f64]) -> f64 {
        match self {
            Reducer::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Reducer::TimeAverage => {
                if values.len() < 2 {
                    return values.first().copied().unwrap_or(f64::NAN);
                }
                let area: f64 = times
                    .windows(2)
                    .zip(values.windows(2))
                    .map(|(t, v)| 0.5 * (t[1] - t[0]) * (v[0] + v[1]))
                    .sum();
                area / (times[times.len() - 1] - times[0])
            }
            Reducer::Final => values.last().copied().unwrap_or(f64::NAN),
            Reducer::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reducer::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl FromStr for Reducer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(Reducer::Mean),
            "time_average" | "time-average" => Ok(Reducer::TimeAverage),
            "final" => Ok(Reducer::Final),
            "min" => Ok(Reducer::Min),
            "max" => Ok(Reducer::Max),
            other => Err(Error::Config(format!("unknown reducer '{other}'"))),
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reducer::Mean => "mean",
            Reducer::TimeAverage => "time_average",
            Reducer::Final => "final",
            Reducer::Min => "min",
            Reducer::Max => "max",
        };
        write!(f, "{name}")
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub reducer: Reducer,

    /// Integrate independent initial states on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Keep the full per-grid-point series in the summary table
    #[serde(default)]
    pub keep_series: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            reducer: Reducer::default(),
            parallel: default_parallel(),
            keep_series: false,
        }
    }
}

/// Runs the full pipeline for one shared dynamics.
#[derive(Debug, Clone)]
pub struct Aggregator {
    generator: LindbladGenerator,
    integrator: Integrator,
    projector: Projector,
    config: AggregationConfig,
}

impl Aggregator {
    /// Fails with `InvalidSubsystemSelection` when the projector does not
    /// factor the generator's dimension.
    pub fn new(
        generator: LindbladGenerator,
        integrator: Integrator,
        projector: Projector,
        config: AggregationConfig,
    ) -> Result<Self> {
        if projector.input_dim() != generator.dim() {
            return Err(Error::InvalidSubsystemSelection(format!(
                "factor dimensions {:?} multiply to {}, generator has dimension {}",
                projector.dims(),
                projector.input_dim(),
                generator.dim()
            )));
        }
        Ok(Self {
            generator,
            integrator,
            projector,
            config,
        })
    }

    pub fn generator(&self) -> &LindbladGenerator {
        &self.generator
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Same pipeline with a different integrator.
    pub fn with_integrator(&self, integrator: Integrator) -> Self {
        Self {
            integrator,
            ..self.clone()
        }
    }

    /// Summary scalar for every (state, measure) pair.
    pub fn run(
        &self,
        states: &Labeled<DensityMatrix>,
        measures: &Labeled<Measure>,
        grid: &TimeGrid,
    ) -> Result<SummaryTable> {
        self.check_measures(measures)?;

        info!(
            states = states.len(),
            measures = measures.len(),
            grid_points = grid.len(),
            reducer = %self.config.reducer,
            parallel = self.config.parallel,
            "Aggregating trajectories"
        );

        let rows: Vec<Vec<Vec<f64>>> = if self.config.parallel {
            states
                .items
                .par_iter()
                .map(|(label, state)| self.series_for(label, state, measures, grid))
                .collect::<Result<_>>()?
        } else {
            states
                .items
                .iter()
                .map(|(label, state)| self.series_for(label, state, measures, grid))
                .collect::<Result<_>>()?
        };

        Ok(SummaryTable::build(
            states.labels().map(String::from).collect(),
            measures.labels().map(String::from).collect(),
            self.config.reducer,
            grid.points().to_vec(),
            rows,
            self.config.keep_series,
        ))
    }

    fn check_measures(&self, measures: &Labeled<Measure>) -> Result<()> {
        let out = self.projector.output_dim();
        for (label, measure) in measures.iter() {
            if let Some(dim) = measure.dim() {
                if dim != out {
                    return Err(Error::DimensionMismatch {
                        operation: format!("measure '{label}' on the projected subsystem"),
                        expected: out,
                        actual: dim,
                    });
                }
            }
        }
        Ok(())
    }

    /// One trajectory, then one series per measure.
    fn series_for(
        &self,
        label: &str,
        state: &DensityMatrix,
        measures: &Labeled<Measure>,
        grid: &TimeGrid,
    ) -> Result<Vec<Vec<f64>>> {
        let trajectory = self
            .integrator
            .integrate(&self.generator, state, grid)
            .map_err(|e| annotate(e, label))?;
        self.evaluate(&trajectory, measures)
    }

    fn evaluate(&self, trajectory: &Trajectory, measures: &Labeled<Measure>) -> Result<Vec<Vec<f64>>> {
        let tol = self.integrator.tolerances();
        let projected: Vec<DensityMatrix> = trajectory
            .states()
            .iter()
            .map(|rho| self.projector.project(rho))
            .collect::<Result<_>>()?;

        measures
            .values()
            .map(|m| {
                projected
                    .iter()
                    .map(|rho| m.evaluate(rho, tol))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect()
    }
}

/// Attach the initial-state label to runtime failures.
fn annotate(err: Error, label: &str) -> Error {
    match err {
        Error::NumericalInstability(msg) => {
            Error::NumericalInstability(format!("initial state '{label}': {msg}"))
        }
        Error::DimensionMismatch {
            operation,
            expected,
            actual,
        } => Error::DimensionMismatch {
            operation: format!("{operation} ('{label}')"),
            expected,
            actual,
        },
        other => other,
    }
}
