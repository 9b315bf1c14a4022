// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Partial-trace projection onto a declared subsystem.

use crate::error::{Error, Result};
use crate::linalg::ops::{partial_trace, validate_selection};
use crate::state::DensityMatrix;

/// Reduces composite states to an ordered subset of their tensor factors.
///
/// `dims` lists the factor dimensions in construction order; `keep` lists the
/// factors to retain, and its order defines the basis order of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projector {
    dims: Vec<usize>,
    keep: Vec<usize>,
}

impl Projector {
    /// Fails with `InvalidSubsystemSelection` for an empty, repeated or
    /// out-of-range `keep`, or zero factor dimensions.
    pub fn new(dims: Vec<usize>, keep: Vec<usize>) -> Result<Self> {
        let total = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| {
                Error::InvalidSubsystemSelection(format!(
                    "factor dimensions {dims:?} overflow the total dimension"
                ))
            })?;
        validate_selection(&dims, &keep, total)?;
        Ok(Self { dims, keep })
    }

    /// Keep-everything projector on a single factor of dimension `dim`.
    pub fn identity(dim: usize) -> Self {
        Self {
            dims: vec![dim],
            keep: vec![0],
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn keep(&self) -> &[usize] {
        &self.keep
    }

    /// Dimension of the composite space.
    pub fn input_dim(&self) -> usize {
        self.dims.iter().product()
    }

    /// Dimension of the reduced space.
    pub fn output_dim(&self) -> usize {
        self.keep.iter().map(|&k| self.dims[k]).product()
    }

    /// True when every factor is kept in its original order.
    pub fn is_identity(&self) -> bool {
        self.keep.iter().copied().eq(0..self.dims.len())
    }

    /// Reduced density matrix of `state`.
    ///
    /// Fails with `InvalidSubsystemSelection` when the factor dimensions do
    /// not multiply to the dimension of `state`.
    pub fn project(&self, state: &DensityMatrix) -> Result<DensityMatrix> {
        if self.is_identity() {
            validate_selection(&self.dims, &self.keep, state.dim())?;
            return Ok(state.clone());
        }
        let reduced = partial_trace(state.matrix(), &self.dims, &self.keep)?;
        Ok(DensityMatrix::from_trusted(reduced))
    }
}
