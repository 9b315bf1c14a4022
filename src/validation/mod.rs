// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation against configured resource limits.

use crate::config::ResourceLimits;
use crate::error::{Result, ValidationError};
use crate::lindblad::IntegrationMethod;

/// Validate the Hilbert-space dimension of a run.
pub fn validate_dimension(
    dim: usize,
    method: IntegrationMethod,
    limits: &ResourceLimits,
) -> Result<()> {
    if dim == 0 {
        return Err(ValidationError::Field {
            field: "dimension".into(),
            message: "must be greater than 0".into(),
        }
        .into());
    }

    check_limit("hilbert_dim", dim, limits.max_hilbert_dim)?;
    if method == IntegrationMethod::Exact {
        check_limit("exact_dim", dim, limits.max_exact_dim)?;
    }
    Ok(())
}

/// Validate time-grid parameters before the grid is built.
pub fn validate_grid(start: f64, stop: f64, points: usize, limits: &ResourceLimits) -> Result<()> {
    for (field, val) in [("grid.start", start), ("grid.stop", stop)] {
        if val.is_nan() {
            return Err(ValidationError::Field {
                field: field.into(),
                message: "is NaN".into(),
            }
            .into());
        }
        if val.is_infinite() {
            return Err(ValidationError::Field {
                field: field.into(),
                message: "is Inf".into(),
            }
            .into());
        }
    }

    if points == 0 {
        return Err(ValidationError::Field {
            field: "grid.points".into(),
            message: "must be greater than 0".into(),
        }
        .into());
    }

    check_limit("grid_points", points, limits.max_grid_points)
}

/// Validate the number of initial states and measures.
pub fn validate_batch(states: usize, measures: usize, limits: &ResourceLimits) -> Result<()> {
    if states == 0 {
        return Err(ValidationError::Field {
            field: "states".into(),
            message: "at least one initial state is required".into(),
        }
        .into());
    }
    if measures == 0 {
        return Err(ValidationError::Field {
            field: "measures".into(),
            message: "at least one measure is required".into(),
        }
        .into());
    }

    check_limit("states", states, limits.max_states)?;
    check_limit("measures", measures, limits.max_measures)
}

/// Reject NaN or Inf entries in caller-supplied numeric data.
pub fn validate_finite(field: &str, values: &[f64]) -> Result<()> {
    for (i, val) in values.iter().enumerate() {
        if val.is_nan() {
            return Err(ValidationError::Field {
                field: field.into(),
                message: format!("contains NaN at index {}", i),
            }
            .into());
        }
        if val.is_infinite() {
            return Err(ValidationError::Field {
                field: field.into(),
                message: format!("contains Inf at index {}", i),
            }
            .into());
        }
    }
    Ok(())
}

fn check_limit(resource: &str, requested: usize, limit: u32) -> Result<()> {
    if requested as u64 > limit as u64 {
        return Err(ValidationError::ResourceLimit {
            resource: resource.into(),
            limit: limit as u64,
            requested: requested as u64,
        }
        .into());
    }
    Ok(())
}
