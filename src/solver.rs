use core::fmt;

use std::time::Duration;

use dyn_stack::{MemBuffer, MemStack};
use faer::linalg::cholesky::llt::factor::{cholesky_in_place, cholesky_in_place_scratch, LltError};
use faer::linalg::matmul::matmul;
use faer::linalg::svd::SvdError;
use faer::linalg::triangular_solve::{
    solve_lower_triangular_in_place, solve_upper_triangular_in_place,
};
use faer::{Accum, Mat, MatMut, MatRef, Par};

use crate::support::SupportError;

/// Errors specific to a solve call.
#[derive(Debug)]
pub enum SolveError {
    /// b has the wrong length for A.
    DimensionMismatch { expected: usize, actual: usize },
    /// A has zero rows or columns.
    EmptyDictionary { nrows: usize, ncols: usize },
    /// The requested OMP support size is zero or exceeds the number of atoms.
    InvalidSupportSize { requested: usize, ncols: usize },
    /// The L1 weight is negative or not finite.
    InvalidLambda { value: f64 },
    /// The supplied support is invalid.
    Support(SupportError),
    /// A Cholesky factorization hit a non-positive pivot.
    Factorization(LltError),
    /// The SVD behind a pseudo-inverse did not converge.
    Svd(SvdError),
    /// Workspace allocation failed.
    WorkspaceAlloc,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "b length {actual} does not match expected {expected}")
            }
            Self::EmptyDictionary { nrows, ncols } => {
                write!(f, "empty dictionary: nrows={nrows}, ncols={ncols}")
            }
            Self::InvalidSupportSize { requested, ncols } => {
                write!(f, "max support {requested} must be in 1..={ncols}")
            }
            Self::InvalidLambda { value } => {
                write!(f, "lambda must be finite and non-negative (got {value})")
            }
            Self::Support(err) => write!(f, "invalid support: {err}"),
            Self::Factorization(err) => write!(f, "cholesky factorization failed: {err}"),
            Self::Svd(err) => write!(f, "svd failed: {err:?}"),
            Self::WorkspaceAlloc => write!(f, "workspace allocation failed"),
        }
    }
}

impl std::error::Error for SolveError {}

impl From<SupportError> for SolveError {
    fn from(err: SupportError) -> Self {
        Self::Support(err)
    }
}

impl From<LltError> for SolveError {
    fn from(err: LltError) -> Self {
        Self::Factorization(err)
    }
}

impl From<SvdError> for SolveError {
    fn from(err: SvdError) -> Self {
        Self::Svd(err)
    }
}

/// Checks that `a` is non-empty and `b` has one entry per row of `a`.
pub(crate) fn check_problem(a: MatRef<'_, f64>, b: &[f64]) -> Result<(), SolveError> {
    if a.nrows() == 0 || a.ncols() == 0 {
        return Err(SolveError::EmptyDictionary {
            nrows: a.nrows(),
            ncols: a.ncols(),
        });
    }
    if b.len() != a.nrows() {
        return Err(SolveError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// out = Aᵗ v.
pub(crate) fn adjoint_apply(a: MatRef<'_, f64>, v: &[f64], out: &mut [f64], par: Par) {
    let v = MatRef::from_column_major_slice(v, a.nrows(), 1);
    let out = MatMut::from_column_major_slice_mut(out, a.ncols(), 1);
    matmul(out, Accum::Replace, a.transpose(), v, 1.0, par);
}

/// Dense copy of the columns of `a` listed in `support`, in that order.
pub(crate) fn gather_columns(a: MatRef<'_, f64>, support: &[usize]) -> Mat<f64> {
    Mat::from_fn(a.nrows(), support.len(), |i, j| a[(i, support[j])])
}

/// Aᵗ A for a tall (or square) block.
pub(crate) fn gram(a: MatRef<'_, f64>, par: Par) -> Mat<f64> {
    let mut gram = Mat::zeros(a.ncols(), a.ncols());
    matmul(gram.as_mut(), Accum::Replace, a.transpose(), a, 1.0, par);
    gram
}

/// Lower Cholesky factor `L` of a symmetric positive definite matrix, `M = L Lᵗ`.
///
/// Only the lower triangle of `m` is read. The strict upper triangle of the
/// result is zero.
pub(crate) fn cholesky_lower(m: MatRef<'_, f64>, par: Par) -> Result<Mat<f64>, SolveError> {
    let dim = m.nrows();
    let mut l = Mat::zeros(dim, dim);
    l.as_mut().copy_from_triangular_lower(m);

    let mut mem = MemBuffer::try_new(cholesky_in_place_scratch::<f64>(
        dim,
        par,
        Default::default(),
    ))
    .map_err(|_| SolveError::WorkspaceAlloc)?;
    let stack = MemStack::new(&mut mem);
    cholesky_in_place(l.as_mut(), Default::default(), par, stack, Default::default())?;

    for j in 1..dim {
        for i in 0..j {
            l[(i, j)] = 0.0;
        }
    }
    Ok(l)
}

/// Solves `L Lᵗ x = rhs` in place given the lower factor `L`.
pub(crate) fn cholesky_solve_in_place(l: MatRef<'_, f64>, rhs: &mut [f64], par: Par) {
    let dim = rhs.len();
    let mut rhs = MatMut::from_column_major_slice_mut(rhs, dim, 1);
    solve_lower_triangular_in_place(l, rhs.as_mut(), par);
    solve_upper_triangular_in_place(l.transpose(), rhs.as_mut(), par);
}

/// Singular values of the restricted normal matrix below `PINV_RCOND * s_max`
/// are treated as zero.
const PINV_RCOND: f64 = 1e-12;

/// Least squares over the columns in `support`, via the pseudo-inverse of the
/// restricted normal matrix: `x_s = pinv(A_sᵗ A_s) A_sᵗ b`.
///
/// Well defined for rank-deficient supports.
pub(crate) fn pinv_lstsq(
    a: MatRef<'_, f64>,
    b: &[f64],
    support: &[usize],
    par: Par,
) -> Result<Vec<f64>, SolveError> {
    if support.is_empty() {
        return Ok(Vec::new());
    }
    let k = support.len();
    let a_s = gather_columns(a, support);
    let svd = gram(a_s.as_ref(), par).thin_svd()?;
    let s = svd.S().column_vector();

    let mut atb = vec![0.0; k];
    adjoint_apply(a_s.as_ref(), b, &mut atb, par);

    // pinv(G) = V S^+ Uᵗ
    let mut scaled = vec![0.0; k];
    adjoint_apply(svd.U(), &atb, &mut scaled, par);
    let s_max = (0..k).map(|i| s[i]).fold(0.0, f64::max);
    let cutoff = PINV_RCOND * s_max;
    for (i, value) in scaled.iter_mut().enumerate() {
        *value = if s[i] > cutoff { *value / s[i] } else { 0.0 };
    }

    let mut coeffs = vec![0.0; k];
    matmul(
        MatMut::from_column_major_slice_mut(&mut coeffs, k, 1),
        Accum::Replace,
        svd.V(),
        MatRef::from_column_major_slice(&scaled, k, 1),
        1.0,
        par,
    );
    Ok(coeffs)
}

/// Least squares over the columns in `support` through a Cholesky solve of
/// the restricted normal equations. Rank-deficient supports fail with
/// `SolveError::Factorization`.
pub(crate) fn cholesky_lstsq(
    a: MatRef<'_, f64>,
    b: &[f64],
    support: &[usize],
    par: Par,
) -> Result<Vec<f64>, SolveError> {
    if support.is_empty() {
        return Ok(Vec::new());
    }
    let a_s = gather_columns(a, support);
    let l = cholesky_lower(gram(a_s.as_ref(), par).as_ref(), par)?;

    let mut coeffs = vec![0.0; support.len()];
    adjoint_apply(a_s.as_ref(), b, &mut coeffs, par);
    cholesky_solve_in_place(l.as_ref(), &mut coeffs, par);
    Ok(coeffs)
}

/// out = b - A_s x_s.
pub(crate) fn restricted_residual(
    a: MatRef<'_, f64>,
    b: &[f64],
    support: &[usize],
    coeffs: &[f64],
    out: &mut [f64],
    par: Par,
) {
    out.copy_from_slice(b);
    if support.is_empty() {
        return;
    }
    let a_s = gather_columns(a, support);
    let n = a.nrows();
    matmul(
        MatMut::from_column_major_slice_mut(out, n, 1),
        Accum::Add,
        a_s.as_ref(),
        MatRef::from_column_major_slice(coeffs, support.len(), 1),
        -1.0,
        par,
    );
}

/// Dense length-`ncols` vector with `coeffs` placed at `support`, zero elsewhere.
pub(crate) fn scatter(ncols: usize, support: &[usize], coeffs: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; ncols];
    for (&index, &value) in support.iter().zip(coeffs.iter()) {
        x[index] = value;
    }
    x
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        sum += x * y;
    }
    sum
}

pub(crate) fn l2_norm(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

pub(crate) fn count_nonzeros(x: &[f64]) -> usize {
    x.iter().filter(|&&v| v != 0.0).count()
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs >= 1.0 {
        format!("{:.3} s", secs)
    } else if secs >= 1e-3 {
        format!("{:.3} ms", secs * 1e3)
    } else if secs >= 1e-6 {
        format!("{:.3} us", secs * 1e6)
    } else {
        format!("{:.0} ns", secs * 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn cholesky_solve_matches_dense_system() {
        let m = mat![[4.0, 2.0, 0.0], [2.0, 5.0, 1.0], [0.0, 1.0, 3.0f64]];
        let l = cholesky_lower(m.as_ref(), Par::Seq).unwrap();
        assert_eq!(l[(0, 1)], 0.0);
        assert_eq!(l[(1, 2)], 0.0);

        let expected = [1.0, -2.0, 0.5];
        let mut rhs = vec![0.0; 3];
        for i in 0..3 {
            rhs[i] = (0..3).map(|j| m[(i, j)] * expected[j]).sum();
        }
        cholesky_solve_in_place(l.as_ref(), &mut rhs, Par::Seq);
        for (got, want) in rhs.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn cholesky_rejects_singular_matrix() {
        let m = mat![[1.0, 1.0], [1.0, 1.0f64]];
        let err = cholesky_lower(m.as_ref(), Par::Seq).unwrap_err();
        assert!(matches!(err, SolveError::Factorization(_)));
    }

    #[test]
    fn pinv_lstsq_handles_repeated_atoms() {
        let a = mat![[1.0, 1.0], [0.0, 0.0f64]];
        let coeffs = pinv_lstsq(a.as_ref(), &[2.0, 0.0], &[0, 1], Par::Seq).unwrap();
        assert!((coeffs[0] - 1.0).abs() < 1e-12);
        assert!((coeffs[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scatter_and_residual() {
        let a = mat![[1.0, 0.0, 2.0], [0.0, 1.0, 1.0f64]];
        let x = scatter(3, &[2], &[1.5]);
        assert_eq!(x, vec![0.0, 0.0, 1.5]);

        let mut r = vec![0.0; 2];
        restricted_residual(a.as_ref(), &[3.0, 2.0], &[2], &[1.5], &mut r, Par::Seq);
        assert!(r[0].abs() < 1e-15);
        assert!((r[1] - 0.5).abs() < 1e-15);

        let mut atv = vec![0.0; 3];
        adjoint_apply(a.as_ref(), &[1.0, 2.0], &mut atv, Par::Seq);
        assert_eq!(atv, vec![1.0, 2.0, 4.0]);
    }
}
