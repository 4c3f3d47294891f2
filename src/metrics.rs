//! Scoring and normalization helpers applied around the solvers.

use faer::{Mat, MatRef};

use crate::solver::l2_norm;

/// Sum of squared differences, `||estimate - truth||_2^2`.
pub fn squared_error(estimate: &[f64], truth: &[f64]) -> f64 {
    debug_assert_eq!(estimate.len(), truth.len());
    estimate
        .iter()
        .zip(truth.iter())
        .map(|(e, t)| (e - t) * (e - t))
        .sum()
}

/// `v / ||v||_2`; the zero vector is returned unchanged.
pub fn normalize_vector_l2(v: &[f64]) -> Vec<f64> {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|value| value / norm).collect()
}

/// Scales every column of `a` to unit L2 norm.
///
/// Returns the normalized matrix and the original column norms, so callers
/// can map coefficients found against the normalized dictionary back with
/// `x_i / norms[i]`. Zero columns are left as they are.
pub fn normalize_columns_l2(a: MatRef<'_, f64>) -> (Mat<f64>, Vec<f64>) {
    let norms: Vec<f64> = (0..a.ncols()).map(|j| a.col(j).norm_l2()).collect();
    let normalized = Mat::from_fn(a.nrows(), a.ncols(), |i, j| {
        if norms[j] == 0.0 {
            a[(i, j)]
        } else {
            a[(i, j)] / norms[j]
        }
    });
    (normalized, norms)
}

/// Peak signal-to-noise ratio in decibels.
///
/// The peak is the dynamic range `max - min` of `truth`; the noise is the mean
/// squared error of `estimate`. Identical inputs give `f64::INFINITY`.
pub fn psnr(truth: &[f64], estimate: &[f64]) -> f64 {
    debug_assert_eq!(estimate.len(), truth.len());
    if truth.is_empty() {
        return f64::INFINITY;
    }
    let max = truth.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = truth.iter().copied().fold(f64::INFINITY, f64::min);
    let range = (max - min).abs();
    let mse = squared_error(estimate, truth) / truth.len() as f64;
    if mse == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (range * range / mse).log10()
}
