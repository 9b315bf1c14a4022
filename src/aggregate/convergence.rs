// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Step-halving convergence check.
//!
//! The summary table is computed twice, the second time with the RK4
//! sub-step halved. The run is considered converged when no summary scalar
//! moves by more than `integrator.convergence_bound`.
//!
//! Exact propagation has no sub-step, so the check is skipped and the
//! report is marked as not applicable.

use serde::Serialize;
use tracing::{debug, warn};

use super::{Aggregator, Labeled, Measure, SummaryTable};
use crate::error::{Error, Result};
use crate::lindblad::{IntegrationMethod, TimeGrid};
use crate::state::DensityMatrix;

/// Outcome of a convergence check.
#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceReport {
    pub method: IntegrationMethod,
    /// False when the method has no step size to refine
    pub applicable: bool,
    pub coarse_max_step: f64,
    pub fine_max_step: f64,
    /// Largest |Δ| over all summary scalars
    pub max_change: f64,
    /// (state, measure) where `max_change` occurs
    pub worst: Option<(String, String)>,
    pub bound: f64,
    pub converged: bool,
}

impl Aggregator {
    /// Run at the configured step and at half of it, and compare.
    ///
    /// Returns the coarse table together with the report.
    pub fn run_with_convergence(
        &self,
        states: &Labeled<DensityMatrix>,
        measures: &Labeled<Measure>,
        grid: &TimeGrid,
    ) -> Result<(SummaryTable, ConvergenceReport)> {
        let coarse = self.run(states, measures, grid)?;
        let config = self.integrator().config();
        if config.method == IntegrationMethod::Exact {
            debug!("Convergence check skipped for exact propagation");
            let report = ConvergenceReport {
                method: config.method,
                applicable: false,
                coarse_max_step: config.max_step,
                fine_max_step: config.max_step,
                max_change: 0.0,
                worst: None,
                bound: config.convergence_bound,
                converged: true,
            };
            return Ok((coarse, report));
        }

        let refined = self.with_integrator(self.integrator().refined());
        let fine = refined.run(states, measures, grid)?;

        let (max_change, worst) = coarse.max_abs_diff(&fine).ok_or_else(|| {
            Error::NumericalInstability("refined run produced different labels".into())
        })?;
        let bound = config.convergence_bound;
        let report = ConvergenceReport {
            method: config.method,
            applicable: true,
            coarse_max_step: config.max_step,
            fine_max_step: refined.integrator().config().max_step,
            max_change,
            worst,
            bound,
            converged: max_change <= bound,
        };

        if report.converged {
            debug!(max_change, bound, "Convergence check passed");
        } else {
            warn!(
                max_change,
                bound,
                worst = ?report.worst,
                "Summary scalars changed by more than the convergence bound under step halving"
            );
        }
        Ok((coarse, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregationConfig;
    use crate::lindblad::{Integrator, IntegratorConfig, LindbladGenerator};
    use crate::projection::Projector;
    use crate::state::library::number;
    use crate::state::{CollapseOperator, HermitianOperator};
    use crate::tolerance::Tolerances;

    fn setup(max_step: f64, bound: f64) -> Aggregator {
        setup_with(IntegrationMethod::Rk4, max_step, bound)
    }

    fn setup_with(method: IntegrationMethod, max_step: f64, bound: f64) -> Aggregator {
        let op = CollapseOperator::amplitude_damping(3, 0.4, "a").unwrap();
        let gen = LindbladGenerator::new(HermitianOperator::zero(3), vec![op]).unwrap();
        let integrator = Integrator::new(
            IntegratorConfig {
                method,
                max_step,
                convergence_bound: bound,
                ..IntegratorConfig::default()
            },
            Tolerances::default(),
        );
        Aggregator::new(gen, integrator, Projector::identity(3), AggregationConfig::default())
            .unwrap()
    }

    fn inputs() -> (Labeled<DensityMatrix>, Labeled<Measure>, TimeGrid) {
        let states = Labeled::from_pairs([("top", DensityMatrix::from_basis_state(3, 2).unwrap())])
            .unwrap();
        let n = HermitianOperator::new("n", number(3), &Tolerances::default()).unwrap();
        let measures = Labeled::from_pairs([("n", Measure::Expectation(n))]).unwrap();
        (states, measures, TimeGrid::linspace(0.0, 5.0, 11).unwrap())
    }

    #[test]
    fn test_fine_steps_converge() {
        let (states, measures, grid) = inputs();
        let (_, report) = setup(0.01, 1e-6)
            .run_with_convergence(&states, &measures, &grid)
            .unwrap();
        assert!(report.converged, "{report:?}");
        assert_eq!(report.fine_max_step, 0.005);
    }

    #[test]
    fn test_coarse_steps_flagged() {
        let (states, measures, grid) = inputs();
        // One RK4 sub-step per grid interval
        let (_, report) = setup(0.5, 1e-12)
            .run_with_convergence(&states, &measures, &grid)
            .unwrap();
        assert!(!report.converged);
        assert!(report.max_change > 1e-12);
        assert_eq!(report.worst, Some(("top".to_string(), "n".to_string())));
    }

    #[test]
    fn test_exact_propagation_is_not_applicable() {
        let (states, measures, grid) = inputs();
        let agg = setup_with(IntegrationMethod::Exact, 0.01, 1e-12);
        let (table, report) = agg.run_with_convergence(&states, &measures, &grid).unwrap();
        assert!(!report.applicable);
        assert_eq!(report.method, IntegrationMethod::Exact);
        assert_eq!(report.fine_max_step, report.coarse_max_step);
        assert!(report.worst.is_none());
        assert_eq!(
            table.get("top", "n"),
            agg.run(&states, &measures, &grid).unwrap().get("top", "n")
        );

        let (_, rk4) = setup(0.01, 1e-6)
            .run_with_convergence(&states, &measures, &grid)
            .unwrap();
        assert!(rk4.applicable);
    }
}
