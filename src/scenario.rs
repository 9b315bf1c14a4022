// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! YAML problem descriptions.
//!
//! A scenario names the composite space, the shared dynamics, the labelled
//! initial states and measures, the time grid and the kept subsystems.
//! [`Scenario::build`] checks it against the configured limits and turns it
//! into a ready-to-run [`Problem`].
//!
//! ```yaml
//! name: decay
//! dims: [4]
//! hamiltonian: { kind: zero }
//! collapse:
//!   - { label: decay, rate: 0.2, operator: { kind: lowering } }
//! states:
//!   - { label: excited, kind: basis, index: 3 }
//! measures:
//!   - { label: n, kind: expectation, operator: { kind: number } }
//! grid: { start: 0.0, stop: 10.0, points: 101 }
//! ```

use std::fs;
use std::path::Path;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{Aggregator, ConvergenceReport, Labeled, Measure, SummaryTable};
use crate::config::Config;
use crate::error::{Error, Result, ValidationError};
use crate::linalg::ops::{embed, identity};
use crate::lindblad::{Integrator, LindbladGenerator, TimeGrid};
use crate::projection::Projector;
use crate::source::{OperatorSource, RandomSource};
use crate::state::library::{lowering, number, pauli_x, pauli_y, pauli_z, projector, raising};
use crate::state::{CollapseOperator, DensityMatrix, HermitianOperator, StateInput};
use crate::tolerance::Tolerances;
use crate::validation::{validate_batch, validate_dimension, validate_finite, validate_grid};

/// Complex matrix or vector entry: `0.5` or `[re, im]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Real(f64),
    Complex([f64; 2]),
}

impl From<Entry> for Complex64 {
    fn from(e: Entry) -> Self {
        match e {
            Entry::Real(re) => Complex64::new(re, 0.0),
            Entry::Complex([re, im]) => Complex64::new(re, im),
        }
    }
}

/// Operator on the full space, or on one factor through `embed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperatorSpec {
    Zero,
    Identity,
    Lowering,
    Raising,
    Number,
    PauliX,
    PauliY,
    PauliZ,
    Projector {
        index: usize,
    },
    /// Row-major entries
    Matrix {
        entries: Vec<Vec<Entry>>,
    },
    /// Seeded random Hermitian matrix
    Random {
        seed: u64,
    },
    /// Operator on factor `factor`, identity elsewhere
    Embed {
        factor: usize,
        operator: Box<OperatorSpec>,
    },
    Scale {
        factor: f64,
        operator: Box<OperatorSpec>,
    },
    Sum {
        terms: Vec<OperatorSpec>,
    },
    /// Matrix product, left to right
    Product {
        factors: Vec<OperatorSpec>,
    },
}

impl OperatorSpec {
    /// Matrix of this operator in dimension `dim`.
    ///
    /// `dims` is the factorization used by `embed`.
    pub fn to_matrix(&self, dim: usize, dims: &[usize], tol: &Tolerances) -> Result<Array2<Complex64>> {
        let m = match self {
            OperatorSpec::Zero => Array2::zeros((dim, dim)),
            OperatorSpec::Identity => identity(dim),
            OperatorSpec::Lowering => lowering(dim),
            OperatorSpec::Raising => raising(dim),
            OperatorSpec::Number => number(dim),
            OperatorSpec::PauliX => require_qubit(pauli_x(), dim, "pauli_x")?,
            OperatorSpec::PauliY => require_qubit(pauli_y(), dim, "pauli_y")?,
            OperatorSpec::PauliZ => require_qubit(pauli_z(), dim, "pauli_z")?,
            OperatorSpec::Projector { index } => projector(dim, *index)?,
            OperatorSpec::Matrix { entries } => matrix_from_rows(entries, dim)?,
            OperatorSpec::Random { seed } => RandomSource::seeded(*seed)
                .hermitian(dim, "random", tol)?
                .matrix()
                .clone(),
            OperatorSpec::Embed { factor, operator } => {
                let local = dims.get(*factor).copied().ok_or_else(|| {
                    Error::InvalidSubsystemSelection(format!(
                        "embed factor {} out of range for {} factors",
                        factor,
                        dims.len()
                    ))
                })?;
                let op = operator.to_matrix(local, &[local], tol)?;
                embed(&op, dims, *factor)?
            }
            OperatorSpec::Scale { factor, operator } => {
                validate_finite("scale.factor", &[*factor])?;
                operator.to_matrix(dim, dims, tol)? * Complex64::new(*factor, 0.0)
            }
            OperatorSpec::Sum { terms } => {
                let mut acc: Array2<Complex64> = Array2::zeros((dim, dim));
                for term in terms {
                    acc = acc + term.to_matrix(dim, dims, tol)?;
                }
                acc
            }
            OperatorSpec::Product { factors } => {
                let mut acc = identity(dim);
                for f in factors {
                    acc = acc.dot(&f.to_matrix(dim, dims, tol)?);
                }
                acc
            }
        };
        Ok(m)
    }
}

fn require_qubit(m: Array2<Complex64>, dim: usize, name: &str) -> Result<Array2<Complex64>> {
    if dim != 2 {
        return Err(Error::DimensionMismatch {
            operation: name.into(),
            expected: 2,
            actual: dim,
        });
    }
    Ok(m)
}

fn matrix_from_rows(rows: &[Vec<Entry>], dim: usize) -> Result<Array2<Complex64>> {
    if rows.len() != dim {
        return Err(Error::DimensionMismatch {
            operation: "matrix rows".into(),
            expected: dim,
            actual: rows.len(),
        });
    }
    let mut m = Array2::zeros((dim, dim));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != dim {
            return Err(Error::DimensionMismatch {
                operation: format!("matrix row {}", i),
                expected: dim,
                actual: row.len(),
            });
        }
        for (j, &e) in row.iter().enumerate() {
            m[[i, j]] = e.into();
        }
    }
    Ok(m)
}

/// A dissipation channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseSpec {
    pub label: String,
    pub rate: f64,
    pub operator: OperatorSpec,
}

impl CollapseSpec {
    fn build(&self, dim: usize, dims: &[usize], tol: &Tolerances) -> Result<CollapseOperator> {
        if let OperatorSpec::Random { seed } = self.operator {
            return RandomSource::seeded(seed).collapse_operator(dim, self.rate, &self.label);
        }
        let m = self.operator.to_matrix(dim, dims, tol)?;
        CollapseOperator::new(self.label.clone(), m, self.rate)
    }
}

/// Initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateKind {
    Basis {
        index: usize,
    },
    /// Amplitudes, normalized on construction
    Vector {
        amplitudes: Vec<Entry>,
    },
    /// Hermitian PSD matrix, normalized by its trace
    Matrix {
        entries: Vec<Vec<Entry>>,
    },
    MaximallyMixed,
    Random {
        seed: u64,
        #[serde(default)]
        pure: bool,
    },
    /// Tensor product, one factor state per entry of `dims`
    Product {
        factors: Vec<StateKind>,
    },
}

impl StateKind {
    fn build(&self, dim: usize, dims: &[usize], tol: &Tolerances) -> Result<DensityMatrix> {
        match self {
            StateKind::Basis { index } => DensityMatrix::from_basis_state(dim, *index),
            StateKind::Vector { amplitudes } => {
                if amplitudes.len() != dim {
                    return Err(Error::DimensionMismatch {
                        operation: "state vector".into(),
                        expected: dim,
                        actual: amplitudes.len(),
                    });
                }
                let psi = amplitudes.iter().map(|&e| e.into()).collect();
                DensityMatrix::make(StateInput::Vector(psi), tol)
            }
            StateKind::Matrix { entries } => {
                DensityMatrix::make(StateInput::Matrix(matrix_from_rows(entries, dim)?), tol)
            }
            StateKind::MaximallyMixed => Ok(DensityMatrix::maximally_mixed(dim)),
            StateKind::Random { seed, pure } => RandomSource::seeded(*seed)
                .with_pure_states(*pure)
                .density_matrix(dim, tol),
            StateKind::Product { factors } => {
                if factors.len() != dims.len() {
                    return Err(Error::InvalidSubsystemSelection(format!(
                        "product state has {} factors, space has {}",
                        factors.len(),
                        dims.len()
                    )));
                }
                let mut parts = factors
                    .iter()
                    .zip(dims)
                    .map(|(f, &d)| f.build(d, &[d], tol));
                let first = parts.next().ok_or_else(|| {
                    Error::InvalidSubsystemSelection("product state has no factors".into())
                })??;
                parts.try_fold(first, |acc, next| Ok(acc.tensor(&next?)))
            }
        }
    }
}

/// Labelled initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    pub label: String,
    #[serde(flatten)]
    pub state: StateKind,
}

/// What is measured on the projected states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeasureKind {
    /// Operator acts on the kept subsystems
    Expectation { operator: OperatorSpec },
    Entropy,
    Purity,
}

/// Labelled measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub label: String,
    #[serde(flatten)]
    pub measure: MeasureKind,
}

/// Evenly spaced time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

/// Complete problem description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,

    /// Factor dimensions of the composite space
    pub dims: Vec<usize>,

    #[serde(default = "default_hamiltonian")]
    pub hamiltonian: OperatorSpec,

    #[serde(default)]
    pub collapse: Vec<CollapseSpec>,

    pub states: Vec<StateSpec>,

    pub measures: Vec<MeasureSpec>,

    pub grid: GridSpec,

    /// Factors kept by the projection; all of them if absent
    #[serde(default)]
    pub keep: Option<Vec<usize>>,
}

fn default_name() -> String {
    "scenario".to_string()
}

fn default_hamiltonian() -> OperatorSpec {
    OperatorSpec::Zero
}

/// Everything needed to run a scenario.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub aggregator: Aggregator,
    pub states: Labeled<DensityMatrix>,
    pub measures: Labeled<Measure>,
    pub grid: TimeGrid,
}

impl Problem {
    pub fn run(&self) -> Result<SummaryTable> {
        self.aggregator.run(&self.states, &self.measures, &self.grid)
    }

    pub fn run_with_convergence(&self) -> Result<(SummaryTable, ConvergenceReport)> {
        self.aggregator
            .run_with_convergence(&self.states, &self.measures, &self.grid)
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Total Hilbert-space dimension, or an error on overflow or an empty factor list.
    pub fn dimension(&self) -> Result<usize> {
        if self.dims.is_empty() || self.dims.contains(&0) {
            return Err(ValidationError::Field {
                field: "dims".into(),
                message: "must be a non-empty list of positive dimensions".into(),
            }
            .into());
        }
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| {
                ValidationError::Field {
                    field: "dims".into(),
                    message: "dimension overflows".into(),
                }
                .into()
            })
    }

    /// Check limits and construct every operator, state and measure.
    pub fn build(&self, config: &Config) -> Result<Problem> {
        let dim = self.dimension()?;
        let tol = &config.tolerances;
        let limits = &config.validation.limits;

        if config.validation.strict {
            validate_dimension(dim, config.integrator.method, limits)?;
            validate_grid(self.grid.start, self.grid.stop, self.grid.points, limits)?;
            validate_batch(self.states.len(), self.measures.len(), limits)?;
        }
        let rates: Vec<f64> = self.collapse.iter().map(|c| c.rate).collect();
        validate_finite("collapse.rate", &rates)?;

        let hamiltonian = HermitianOperator::new(
            "hamiltonian",
            self.hamiltonian.to_matrix(dim, &self.dims, tol)?,
            tol,
        )?;
        let collapse = self
            .collapse
            .iter()
            .map(|c| c.build(dim, &self.dims, tol))
            .collect::<Result<Vec<_>>>()?;
        let generator = LindbladGenerator::new(hamiltonian, collapse)?;

        let keep = self
            .keep
            .clone()
            .unwrap_or_else(|| (0..self.dims.len()).collect());
        let projector = Projector::new(self.dims.clone(), keep)?;
        let reduced_dims: Vec<usize> = projector.keep().iter().map(|&k| self.dims[k]).collect();
        let reduced_dim = projector.output_dim();

        let mut states = Labeled::new();
        for spec in &self.states {
            states.push(spec.label.clone(), spec.state.build(dim, &self.dims, tol)?)?;
        }

        let mut measures = Labeled::new();
        for spec in &self.measures {
            let measure = match &spec.measure {
                MeasureKind::Expectation { operator } => Measure::Expectation(HermitianOperator::new(
                    spec.label.clone(),
                    operator.to_matrix(reduced_dim, &reduced_dims, tol)?,
                    tol,
                )?),
                MeasureKind::Entropy => Measure::Entropy,
                MeasureKind::Purity => Measure::Purity,
            };
            measures.push(spec.label.clone(), measure)?;
        }

        let grid = TimeGrid::linspace(self.grid.start, self.grid.stop, self.grid.points)?;
        let integrator = Integrator::new(config.integrator.clone(), *tol);
        let aggregator = Aggregator::new(generator, integrator, projector, config.aggregation.clone())?;

        debug!(
            scenario = %self.name,
            dim,
            reduced_dim,
            channels = self.collapse.len(),
            "Scenario built"
        );

        Ok(Problem {
            name: self.name.clone(),
            aggregator,
            states,
            measures,
            grid,
        })
    }

    /// Scenario used by the `demo` subcommand: a qubit coupled to a damped
    /// three-level mode, observed on the qubit.
    pub fn demo() -> Self {
        Scenario {
            name: "qubit-mode exchange".into(),
            dims: vec![2, 3],
            hamiltonian: OperatorSpec::Sum {
                terms: vec![
                    OperatorSpec::Scale {
                        factor: 0.5,
                        operator: Box::new(OperatorSpec::Embed {
                            factor: 0,
                            operator: Box::new(OperatorSpec::PauliZ),
                        }),
                    },
                    OperatorSpec::Embed {
                        factor: 1,
                        operator: Box::new(OperatorSpec::Number),
                    },
                    OperatorSpec::Scale {
                        factor: 0.2,
                        operator: Box::new(OperatorSpec::Sum {
                            terms: vec![
                                exchange(OperatorSpec::Raising, OperatorSpec::Lowering),
                                exchange(OperatorSpec::Lowering, OperatorSpec::Raising),
                            ],
                        }),
                    },
                ],
            },
            collapse: vec![
                CollapseSpec {
                    label: "mode_decay".into(),
                    rate: 0.1,
                    operator: OperatorSpec::Embed {
                        factor: 1,
                        operator: Box::new(OperatorSpec::Lowering),
                    },
                },
                CollapseSpec {
                    label: "qubit_dephasing".into(),
                    rate: 0.05,
                    operator: OperatorSpec::Embed {
                        factor: 0,
                        operator: Box::new(OperatorSpec::PauliZ),
                    },
                },
            ],
            states: vec![
                StateSpec {
                    label: "ground".into(),
                    state: StateKind::Basis { index: 0 },
                },
                StateSpec {
                    label: "excited_mode".into(),
                    state: StateKind::Product {
                        factors: vec![
                            StateKind::Basis { index: 0 },
                            StateKind::Basis { index: 2 },
                        ],
                    },
                },
                StateSpec {
                    label: "mixed".into(),
                    state: StateKind::MaximallyMixed,
                },
            ],
            measures: vec![
                MeasureSpec {
                    label: "sigma_z".into(),
                    measure: MeasureKind::Expectation {
                        operator: OperatorSpec::PauliZ,
                    },
                },
                MeasureSpec {
                    label: "entropy".into(),
                    measure: MeasureKind::Entropy,
                },
                MeasureSpec {
                    label: "purity".into(),
                    measure: MeasureKind::Purity,
                },
            ],
            grid: GridSpec {
                start: 0.0,
                stop: 10.0,
                points: 101,
            },
            keep: Some(vec![0]),
        }
    }
}

fn exchange(qubit: OperatorSpec, mode: OperatorSpec) -> OperatorSpec {
    OperatorSpec::Product {
        factors: vec![
            OperatorSpec::Embed {
                factor: 0,
                operator: Box::new(qubit),
            },
            OperatorSpec::Embed {
                factor: 1,
                operator: Box::new(mode),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_matrix_close, c};
    use approx::assert_relative_eq;

    const DECAY: &str = r#"
name: decay
dims: [4]
collapse:
  - { label: decay, rate: 0.2, operator: { kind: lowering } }
states:
  - { label: excited, kind: basis, index: 3 }
  - { label: superposition, kind: vector, amplitudes: [1.0, 0.0, 0.0, [0.0, 1.0]] }
measures:
  - { label: n, kind: expectation, operator: { kind: number } }
  - { label: S, kind: entropy }
grid: { start: 0.0, stop: 5.0, points: 11 }
"#;

    #[test]
    fn test_parse_and_run() {
        let scenario = Scenario::from_yaml(DECAY).unwrap();
        assert_eq!(scenario.name, "decay");
        assert_eq!(scenario.hamiltonian, OperatorSpec::Zero);
        assert!(scenario.keep.is_none());

        let problem = scenario.build(&Config::default()).unwrap();
        assert_eq!(problem.states.labels().collect::<Vec<_>>(), vec!["excited", "superposition"]);
        let table = problem.run().unwrap();
        let n = table.get("excited", "n").unwrap();
        assert!(n > 0.0 && n < 3.0);
        assert!(table.get("superposition", "S").unwrap() >= 0.0);
    }

    #[test]
    fn test_embed_and_sum() {
        let tol = Tolerances::default();
        let spec = OperatorSpec::Sum {
            terms: vec![
                OperatorSpec::Embed {
                    factor: 0,
                    operator: Box::new(OperatorSpec::PauliZ),
                },
                OperatorSpec::Scale {
                    factor: 2.0,
                    operator: Box::new(OperatorSpec::Identity),
                },
            ],
        };
        let m = spec.to_matrix(4, &[2, 2], &tol).unwrap();
        let diag: Vec<f64> = (0..4).map(|i| m[[i, i]].re).collect();
        assert_eq!(diag, vec![3.0, 3.0, 1.0, 1.0]);

        let bad = OperatorSpec::Embed {
            factor: 2,
            operator: Box::new(OperatorSpec::PauliZ),
        };
        assert!(matches!(
            bad.to_matrix(4, &[2, 2], &tol),
            Err(Error::InvalidSubsystemSelection(_))
        ));
        assert!(OperatorSpec::PauliX.to_matrix(3, &[3], &tol).is_err());

        // σ⁺σ⁻ = |1⟩⟨1| in the raising convention a†|0⟩ = |1⟩
        let pm = OperatorSpec::Product {
            factors: vec![OperatorSpec::Raising, OperatorSpec::Lowering],
        };
        assert_matrix_close(
            &pm.to_matrix(2, &[2], &tol).unwrap(),
            &OperatorSpec::Number.to_matrix(2, &[2], &tol).unwrap(),
            1e-15,
        );
    }

    #[test]
    fn test_matrix_entries() {
        let yaml = "kind: matrix\nentries: [[1.0, [0.0, -1.0]], [[0.0, 1.0], -1.0]]";
        let spec: OperatorSpec = serde_yaml::from_str(yaml).unwrap();
        let m = spec.to_matrix(2, &[2], &Tolerances::default()).unwrap();
        assert_eq!(m[[0, 1]], Complex64::new(0.0, -1.0));
        assert_eq!(m[[1, 1]], c(-1.0));
        assert!(spec.to_matrix(3, &[3], &Tolerances::default()).is_err());
    }

    #[test]
    fn test_product_state_and_projection() {
        let yaml = r#"
dims: [2, 2]
states:
  - label: plus_one
    kind: product
    factors:
      - { kind: vector, amplitudes: [1.0, 1.0] }
      - { kind: basis, index: 1 }
measures:
  - { label: x, kind: expectation, operator: { kind: pauli_x } }
  - { label: purity, kind: purity }
grid: { start: 0.0, stop: 1.0, points: 3 }
keep: [0]
"#;
        let problem = Scenario::from_yaml(yaml)
            .unwrap()
            .build(&Config::default())
            .unwrap();
        let rho = problem.states.get("plus_one").unwrap();
        let reduced = problem.aggregator.projector().project(rho).unwrap();
        let half = c(0.5);
        assert_matrix_close(
            reduced.matrix(),
            &ndarray::array![[half, half], [half, half]],
            1e-12,
        );

        let table = problem.run().unwrap();
        assert_relative_eq!(table.get("plus_one", "x").unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(table.get("plus_one", "purity").unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_limits_and_labels() {
        let mut scenario = Scenario::from_yaml(DECAY).unwrap();
        let mut config = Config::default();
        config.validation.limits.max_hilbert_dim = 2;
        assert!(matches!(
            scenario.build(&config),
            Err(Error::Validation(ValidationError::ResourceLimit { .. }))
        ));
        config.validation.strict = false;
        assert!(scenario.build(&config).is_ok());

        scenario.states[1].label = "excited".into();
        assert!(scenario.build(&Config::default()).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let config = Config::default();
        let mut scenario = Scenario::from_yaml(DECAY).unwrap();
        scenario.collapse[0].rate = -0.1;
        assert!(matches!(scenario.build(&config), Err(Error::NegativeRate { .. })));

        let mut scenario = Scenario::from_yaml(DECAY).unwrap();
        scenario.keep = Some(vec![1]);
        assert!(matches!(
            scenario.build(&config),
            Err(Error::InvalidSubsystemSelection(_))
        ));

        let mut scenario = Scenario::from_yaml(DECAY).unwrap();
        scenario.hamiltonian = OperatorSpec::Lowering;
        assert!(matches!(scenario.build(&config), Err(Error::NotHermitian { .. })));

        assert!(Scenario::from_yaml("dims: [2]\nstates: []\nmeasures: []\ngrid: {start: 0, stop: 1, points: 2}\nhamiltonian: {kind: bogus}").is_err());
    }

    #[test]
    fn test_demo_scenario_builds() {
        let problem = Scenario::demo().build(&Config::default()).unwrap();
        assert_eq!(problem.aggregator.generator().dim(), 6);
        assert_eq!(problem.aggregator.projector().output_dim(), 2);
        assert_eq!(problem.measures.len(), 3);
    }
}
