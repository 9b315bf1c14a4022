// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense complex matrix operations.
//!
//! All functions are pure: they borrow their operands and return freshly
//! allocated matrices.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Error, Result};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Return the dimension of a square matrix, or `DimensionMismatch`.
pub fn require_square(m: &Array2<Complex64>, operation: &str) -> Result<usize> {
    if m.nrows() != m.ncols() {
        return Err(Error::DimensionMismatch {
            operation: format!("{operation} (square matrix required)"),
            expected: m.nrows(),
            actual: m.ncols(),
        });
    }
    Ok(m.nrows())
}

/// Fail with `DimensionMismatch` unless `m` is `dim × dim`.
pub fn require_dim(m: &Array2<Complex64>, dim: usize, operation: &str) -> Result<()> {
    let n = require_square(m, operation)?;
    if n != dim {
        return Err(Error::DimensionMismatch {
            operation: operation.to_string(),
            expected: dim,
            actual: n,
        });
    }
    Ok(())
}

/// d × d identity.
pub fn identity(dim: usize) -> Array2<Complex64> {
    Array2::from_diag_elem(dim, ONE)
}

/// Dimension-checked matrix product A·B.
pub fn matmul(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    if a.ncols() != b.nrows() {
        return Err(Error::DimensionMismatch {
            operation: "matmul".into(),
            expected: a.ncols(),
            actual: b.nrows(),
        });
    }
    Ok(a.dot(b))
}

/// Conjugate transpose (dagger) of a matrix.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Sum of diagonal entries.
pub fn trace(m: &Array2<Complex64>) -> Complex64 {
    m.diag().iter().sum()
}

/// Commutator [A, B] = AB − BA.
pub fn commutator(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    Ok(matmul(a, b)? - matmul(b, a)?)
}

/// Anticommutator {A, B} = AB + BA.
pub fn anticommutator(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    Ok(matmul(a, b)? + matmul(b, a)?)
}

/// Kronecker product A ⊗ B.
pub fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    let mut out = Array2::zeros((ar * br, ac * bc));
    for ((i, j), &aij) in a.indexed_iter() {
        if aij == ZERO {
            continue;
        }
        for ((k, l), &bkl) in b.indexed_iter() {
            out[[i * br + k, j * bc + l]] = aij * bkl;
        }
    }
    out
}

/// Kronecker product of a sequence, first factor outermost.
pub fn kron_all(factors: &[Array2<Complex64>]) -> Array2<Complex64> {
    factors
        .iter()
        .fold(Array2::from_elem((1, 1), ONE), |acc, f| kron(&acc, f))
}

/// Hermitian part (M + M†) / 2.
pub fn hermitian_part(m: &Array2<Complex64>) -> Array2<Complex64> {
    (m + &dagger(m)) * Complex64::new(0.5, 0.0)
}

/// Largest entrywise deviation |M_ij − conj(M_ji)|.
pub fn hermiticity_deviation(m: &Array2<Complex64>) -> f64 {
    let n = m.nrows();
    let mut worst = 0.0f64;
    for i in 0..n {
        for j in i..n {
            worst = worst.max((m[[i, j]] - m[[j, i]].conj()).norm());
        }
    }
    worst
}

/// Largest entrywise |A − B|. Shapes must match.
pub fn max_abs_diff(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Result<f64> {
    if a.dim() != b.dim() {
        return Err(Error::DimensionMismatch {
            operation: "max_abs_diff".into(),
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max))
}

/// Frobenius norm ‖M‖_F.
pub fn frobenius_norm(m: &Array2<Complex64>) -> f64 {
    m.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt()
}

/// True when no entry is NaN or infinite.
pub fn is_finite(m: &Array2<Complex64>) -> bool {
    m.iter().all(|z| z.re.is_finite() && z.im.is_finite())
}

/// Outer product |u⟩⟨v|.
pub fn outer(u: &[Complex64], v: &[Complex64]) -> Array2<Complex64> {
    Array2::from_shape_fn((u.len(), v.len()), |(i, j)| u[i] * v[j].conj())
}

/// Check that `keep` selects distinct, in-range factors of `dims`, and that
/// `dims` factorizes a space of dimension `total`.
pub fn validate_selection(dims: &[usize], keep: &[usize], total: usize) -> Result<()> {
    if dims.is_empty() {
        return Err(Error::InvalidSubsystemSelection(
            "no tensor factors declared".into(),
        ));
    }
    if dims.contains(&0) {
        return Err(Error::InvalidSubsystemSelection(format!(
            "factor dimensions {dims:?} contain a zero"
        )));
    }
    let product: usize = dims.iter().product();
    if product != total {
        return Err(Error::InvalidSubsystemSelection(format!(
            "factor dimensions {dims:?} multiply to {product}, state has dimension {total}"
        )));
    }
    if keep.is_empty() {
        return Err(Error::InvalidSubsystemSelection(
            "at least one factor must be retained".into(),
        ));
    }
    for (pos, &k) in keep.iter().enumerate() {
        if k >= dims.len() {
            return Err(Error::InvalidSubsystemSelection(format!(
                "factor {k} out of range for {} factors",
                dims.len()
            )));
        }
        if keep[..pos].contains(&k) {
            return Err(Error::InvalidSubsystemSelection(format!(
                "factor {k} selected more than once"
            )));
        }
    }
    Ok(())
}

/// Row-major strides of a tensor-product index (last factor varies fastest).
fn strides(dims: &[usize]) -> Vec<usize> {
    let mut out = vec![1; dims.len()];
    for k in (0..dims.len().saturating_sub(1)).rev() {
        out[k] = out[k + 1] * dims[k + 1];
    }
    out
}

/// Full-space offset of a multi-index over `factors`, enumerated in
/// mixed radix with the first listed factor most significant.
fn offsets(factors: &[usize], dims: &[usize], strides: &[usize]) -> Vec<usize> {
    let count: usize = factors.iter().map(|&f| dims[f]).product();
    (0..count)
        .map(|mut idx| {
            let mut off = 0;
            for &f in factors.iter().rev() {
                off += (idx % dims[f]) * strides[f];
                idx /= dims[f];
            }
            off
        })
        .collect()
}

/// Partial trace keeping the ordered factors in `keep` and summing out the rest.
///
/// `dims` lists the factor dimensions in the order used to build the
/// composite space with [`kron`]. The reduced matrix is expressed over the
/// kept factors in the order given by `keep`.
pub fn partial_trace(
    m: &Array2<Complex64>,
    dims: &[usize],
    keep: &[usize],
) -> Result<Array2<Complex64>> {
    let n = require_square(m, "partial_trace")?;
    validate_selection(dims, keep, n)?;

    let traced: Vec<usize> = (0..dims.len()).filter(|k| !keep.contains(k)).collect();
    let st = strides(dims);
    let kept_off = offsets(keep, dims, &st);
    let traced_off = offsets(&traced, dims, &st);

    let d = kept_off.len();
    let mut out = Array2::zeros((d, d));
    for (r, &ro) in kept_off.iter().enumerate() {
        for (c, &co) in kept_off.iter().enumerate() {
            out[[r, c]] = traced_off.iter().map(|&t| m[[ro + t, co + t]]).sum();
        }
    }
    Ok(out)
}

/// Lift a single-factor operator into the composite space: I ⊗ … ⊗ A ⊗ … ⊗ I.
pub fn embed(op: &Array2<Complex64>, dims: &[usize], factor: usize) -> Result<Array2<Complex64>> {
    if factor >= dims.len() {
        return Err(Error::InvalidSubsystemSelection(format!(
            "factor {factor} out of range for {} factors",
            dims.len()
        )));
    }
    require_dim(op, dims[factor], "embed")?;
    let left: usize = dims[..factor].iter().product();
    let right: usize = dims[factor + 1..].iter().product();
    Ok(kron(&kron(&identity(left), op), &identity(right)))
}
