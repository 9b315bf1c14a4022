// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the dynamics engine.

use std::fmt;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error types.
///
/// Every variant is local to the operation that detected it. None of them are
/// transient, so nothing in the crate retries.
#[derive(Debug)]
pub enum Error {
    /// Operand dimensions are incompatible
    DimensionMismatch {
        operation: String,
        expected: usize,
        actual: usize,
    },
    /// Operator failed the M = M† check at construction
    NotHermitian { label: String, deviation: f64 },
    /// Eigendecomposition was handed a non-Hermitian matrix
    NonHermitianInput { deviation: f64 },
    /// Density-matrix invariant violated
    InvalidDensityMatrix(DensityViolation),
    /// Dissipation channel with a negative coupling rate
    NegativeRate { label: String, rate: f64 },
    /// Malformed projection request
    InvalidSubsystemSelection(String),
    /// Runtime residual exceeded tolerance
    NumericalInstability(String),
    /// Time grid is empty, non-finite or not strictly increasing
    InvalidTimeGrid(String),
    /// Integration stopped by a cancellation token
    Cancelled { completed_steps: usize },
    /// Input validation error
    Validation(ValidationError),
    /// Configuration error
    Config(String),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

/// The density-matrix invariant that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityViolation {
    /// Largest |M - M†| entry
    NotHermitian { deviation: f64 },
    /// Smallest eigenvalue
    NegativeEigenvalue { value: f64 },
    /// Trace after normalization (or before, for explicit checks)
    Trace { value: f64 },
    /// State vector or matrix has zero norm/trace and cannot be normalized
    ZeroNorm,
}

impl fmt::Display for DensityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityViolation::NotHermitian { deviation } => {
                write!(f, "not Hermitian (max deviation {:.3e})", deviation)
            }
            DensityViolation::NegativeEigenvalue { value } => {
                write!(f, "not positive semi-definite (eigenvalue {:.3e})", value)
            }
            DensityViolation::Trace { value } => write!(f, "trace is {:.12} instead of 1", value),
            DensityViolation::ZeroNorm => write!(f, "zero norm cannot be normalized"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DimensionMismatch {
                operation,
                expected,
                actual,
            } => write!(
                f,
                "Dimension mismatch in {}: expected {}, got {}",
                operation, expected, actual
            ),
            Error::NotHermitian { label, deviation } => write!(
                f,
                "Operator '{}' is not Hermitian (max deviation {:.3e})",
                label, deviation
            ),
            Error::NonHermitianInput { deviation } => write!(
                f,
                "Eigendecomposition requires a Hermitian matrix (max deviation {:.3e})",
                deviation
            ),
            Error::InvalidDensityMatrix(v) => write!(f, "Invalid density matrix: {}", v),
            Error::NegativeRate { label, rate } => write!(
                f,
                "Collapse operator '{}' has negative rate {:.3e}",
                label, rate
            ),
            Error::InvalidSubsystemSelection(msg) => {
                write!(f, "Invalid subsystem selection: {}", msg)
            }
            Error::NumericalInstability(msg) => write!(f, "Numerical instability: {}", msg),
            Error::InvalidTimeGrid(msg) => write!(f, "Invalid time grid: {}", msg),
            Error::Cancelled { completed_steps } => {
                write!(f, "Integration cancelled after {} steps", completed_steps)
            }
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<DensityViolation> for Error {
    fn from(v: DensityViolation) -> Self {
        Error::InvalidDensityMatrix(v)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Validation errors.
#[derive(Debug)]
pub enum ValidationError {
    /// Field validation failed
    Field { field: String, message: String },
    /// Resource limit exceeded
    ResourceLimit {
        resource: String,
        limit: u64,
        requested: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "Field '{}': {}", field, message)
            }
            ValidationError::ResourceLimit {
                resource,
                limit,
                requested,
            } => {
                write!(
                    f,
                    "Resource limit exceeded for {}: limit={}, requested={}",
                    resource, limit, requested
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
