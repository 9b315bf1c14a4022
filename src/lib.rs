// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Dynamics
//!
//! Open-quantum-system engine: evolves density matrices under the
//! Lindblad (GKSL) master equation, projects them onto subsystems and
//! reduces observables over a time grid into a summary table.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        CLI  /  Scenario  /  Report       │
//! ├─────────────────────────────────────────┤
//! │              Aggregator                  │
//! │   (rayon fan-out over initial states)    │
//! ├───────────────┬─────────────┬───────────┤
//! │  Integrator   │  Projector  │ Observables│
//! │ (RK4 / exact) │ (partial Tr)│            │
//! ├───────────────┴─────────────┴───────────┤
//! │    Lindblad generator / Liouvillian      │
//! ├─────────────────────────────────────────┤
//! │   States & operators  │  Linear algebra  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`linalg`]: dense complex kernel (products, Kronecker, partial trace, eigh, expm)
//! - [`state`]: density matrices, Hermitian and collapse operators
//! - [`lindblad`]: generator, superoperator and integrator
//! - [`projection`]: partial-trace projector
//! - [`observables`]: expectation values, entropy, distances
//! - [`aggregate`]: trajectory aggregation and convergence check
//! - [`source`]: injected operator and state sources
//! - [`scenario`]: YAML problem descriptions
//! - [`report`]: table and JSON rendering
//! - [`config`]: configuration management
//! - [`validation`]: resource limits
//! - [`error`]: error types

pub mod aggregate;
pub mod config;
pub mod error;
pub mod linalg;
pub mod lindblad;
pub mod observables;
pub mod projection;
pub mod report;
pub mod scenario;
pub mod source;
pub mod state;
pub mod tolerance;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
