// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense complex linear algebra on `ndarray::Array2<Complex64>`.
//!
//! # Modules
//!
//! - [`ops`]: products, dagger, Kronecker product, trace, partial trace, embedding
//! - [`eigh`]: Hermitian eigendecomposition (complex Jacobi)
//! - [`expm`]: matrix exponential via scaling-and-squaring + Padé(13)

pub mod eigh;
pub mod expm;
pub mod ops;

pub use eigh::{eigh, eigvalsh, Eigh};
pub use expm::matrix_exp;
pub use ops::{
    anticommutator, commutator, dagger, embed, hermitian_part, hermiticity_deviation, identity,
    kron, kron_all, matmul, partial_trace, trace,
};
