// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed quantum states and operators.
//!
//! Construction validates the type's invariants once; downstream
//! components accept these types without re-checking.

pub mod density;
pub mod library;
pub mod operator;

pub use density::{DensityMatrix, StateInput};
pub use operator::{CollapseOperator, HermitianOperator};
